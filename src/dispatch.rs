//! Dispatch of extracted records across the message boundary.
//!
//! Sending is fire-and-callback: [`Dispatcher::send`] only hands the request
//! to the channel, and the outcome comes back later as a [`Completion`]. The
//! session marks a post as seen only on a successful completion.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use crate::error::DispatchError;
use crate::protocol::{Request, Response};
use crate::store::PostStore;

/// Identifies one in-flight dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ticket {
    /// Session generation the record was extracted in.
    pub generation: u64,
    pub post_id: String,
}

/// Outcome of one dispatch, delivered asynchronously.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub ticket: Ticket,
    pub result: Result<Response, DispatchError>,
}

impl Completion {
    /// Collapse the channel result and the collaborator's `success` flag.
    ///
    /// # Errors
    ///
    /// Returns the channel error, or `DispatchError::Rejected` for a
    /// `success: false` response.
    pub fn outcome(&self) -> Result<(), DispatchError> {
        match &self.result {
            Ok(response) if response.success => Ok(()),
            Ok(response) => Err(DispatchError::Rejected(
                response
                    .error
                    .clone()
                    .unwrap_or_else(|| "no error given".to_string()),
            )),
            Err(e) => Err(e.clone()),
        }
    }
}

/// Host capability: the messaging channel to the persistence collaborator.
pub trait Dispatcher {
    /// Whether the runtime behind the channel is reachable.
    fn is_available(&self) -> bool;

    /// Hand a request to the channel.
    ///
    /// # Errors
    ///
    /// Returns an error when the channel refuses the message outright (for
    /// example after the extension context was invalidated). No completion
    /// follows an error.
    fn send(&mut self, ticket: Ticket, request: Request) -> Result<(), DispatchError>;

    /// Completions that arrived since the last call.
    ///
    /// Hosts that deliver completions through their own event loop can leave
    /// this empty and feed them to the session directly.
    fn poll_completions(&mut self) -> Vec<Completion> {
        Vec::new()
    }
}

/// Dispatcher delivering into an in-process [`PostStore`].
///
/// Replies are queued and surface on the next [`Dispatcher::poll_completions`],
/// like a callback arriving on a later turn of the event loop.
#[derive(Debug, Clone)]
pub struct StoreDispatcher {
    store: Rc<RefCell<PostStore>>,
    available: Rc<Cell<bool>>,
    queued: VecDeque<Completion>,
}

impl StoreDispatcher {
    #[must_use]
    pub fn new(store: Rc<RefCell<PostStore>>) -> Self {
        Self {
            store,
            available: Rc::new(Cell::new(true)),
            queued: VecDeque::new(),
        }
    }

    /// Shared switch for simulating a reloaded/invalidated runtime.
    #[must_use]
    pub fn availability(&self) -> Rc<Cell<bool>> {
        Rc::clone(&self.available)
    }

    #[must_use]
    pub fn store(&self) -> Rc<RefCell<PostStore>> {
        Rc::clone(&self.store)
    }
}

impl Dispatcher for StoreDispatcher {
    fn is_available(&self) -> bool {
        self.available.get()
    }

    fn send(&mut self, ticket: Ticket, request: Request) -> Result<(), DispatchError> {
        if !self.available.get() {
            return Err(DispatchError::ContextInvalidated);
        }
        let response = self.store.borrow_mut().handle(request);
        self.queued.push_back(Completion {
            ticket,
            result: Ok(response),
        });
        Ok(())
    }

    fn poll_completions(&mut self) -> Vec<Completion> {
        self.queued.drain(..).collect()
    }
}
