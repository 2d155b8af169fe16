use crate::error::{RedirectorError, Result};
use crate::events::message::Message;
use crate::navigation::NavigationEvent;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{trace, warn};

/// Something a listener can react to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Event {
	/// A tab changed its loading state.
	Navigation(NavigationEvent),

	/// A change notification from another surface.
	Message(Message),
}

/// Side effects requested by listeners, carried out by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "camelCase")]
pub enum Effect {
	/// Navigate an existing tab to `url`.
	UpdateTab {
		#[serde(rename = "tabId")]
		tab_id: u32,
		url: String,
	},

	/// Open `url` in a new tab.
	CreateTab { url: String },

	/// Show a user-visible notification.
	Notify { title: String, message: String },

	/// Deliver `message` to every listener, including the sender.
	Broadcast { message: Message },
}

/// A component subscribed to events.
pub trait Listener {
	fn on_event(&mut self, event: &Event) -> Result<Vec<Effect>>;
}

/// Everything one [`Dispatcher::run`] produced.
#[derive(Debug, Default)]
pub struct Dispatched {
	/// Effects in the order listeners returned them.
	pub effects: Vec<Effect>,

	/// Listener failures, in the order they happened.
	pub errors: Vec<RedirectorError>,
}

impl Dispatched {
	pub fn is_ok(&self) -> bool {
		self.errors.is_empty()
	}
}

/// Delivers events to subscribed listeners in FIFO order.
///
/// Broadcast effects are queued behind the events already pending, so a
/// configuration change published before a navigation is always applied
/// before that navigation is evaluated.
#[derive(Default)]
pub struct Dispatcher {
	listeners: Vec<Box<dyn Listener>>,
	queue: VecDeque<Event>,
}

impl Dispatcher {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn subscribe(&mut self, listener: impl Listener + 'static) {
		self.listeners.push(Box::new(listener));
	}

	/// Queue an event without delivering it yet.
	pub fn publish(&mut self, event: Event) {
		self.queue.push_back(event);
	}

	pub fn pending(&self) -> usize {
		self.queue.len()
	}

	/// Deliver queued events until the queue is empty.
	///
	/// A failing listener contributes no effects for that event. Other
	/// listeners and later events are still delivered, so effects of state
	/// changes that did commit are never lost.
	pub fn run(&mut self) -> Dispatched {
		let mut out = Dispatched::default();

		while let Some(event) = self.queue.pop_front() {
			trace!(?event, "dispatching");
			for listener in &mut self.listeners {
				let effects = match listener.on_event(&event) {
					Ok(effects) => effects,
					Err(e) => {
						warn!(error = %e, "listener failed");
						out.errors.push(e);
						continue;
					}
				};

				for effect in effects {
					if let Effect::Broadcast { message } = &effect {
						self.queue.push_back(Event::Message(message.clone()));
					}
					out.effects.push(effect);
				}
			}
		}

		out
	}

	/// Publish one event and run the queue.
	pub fn dispatch(&mut self, event: Event) -> Dispatched {
		self.publish(event);
		self.run()
	}
}
