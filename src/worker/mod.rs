// Per-connection worker queue.
//
// channel:    the command set flowing from handles to the worker thread
// dispatcher: the worker-thread loop owning the engine handle
// manager:    spawn/shutdown and the typed request surface used by handles

mod channel;
mod dispatcher;
mod manager;

pub(crate) use channel::StatementId;
pub(crate) use manager::Worker;
