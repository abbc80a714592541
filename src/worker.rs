//! The GPG worker loop (spec.md sections 4.12, 5): wait-event, dispatch,
//! signal-done. Modeled on the hosted mpsc-channel worker idiom used
//! throughout the teacher tree's non-bare-metal builds (`log-server`'s
//! `implementation::Output::run`, `keystore`'s
//! `reply_and_receive_next`) -- a blocking `recv` stands in for the
//! event-flag wait the original firmware uses, since this crate has no
//! access to that RTOS's primitives (spec.md section 1's scope
//! exclusions).
//!
//! Ordering and suspension match spec.md section 5 exactly: the worker
//! is parked at `recv` and nowhere else, one command runs to completion
//! before the next is accepted, and there is no cancellation or
//! per-command timeout -- the caller of `spawn` owns bounding, standing
//! in for "the transport owns bounding."

use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::JoinHandle;

use crate::session::Session;

/// One command APDU buffer, submitted by the transport side.
pub type Request = Vec<u8>;
/// One response APDU buffer (payload‖SW1‖SW2), returned to the transport.
pub type Response = Vec<u8>;

/// Handle held by the transport side: submit a request, receive the
/// matching response.
pub struct WorkerHandle {
    request_tx: Sender<Request>,
    response_rx: Receiver<Response>,
    join: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    /// Submits one command APDU and blocks for its response. Requests
    /// are processed strictly in submission order (spec.md section 5,
    /// "Ordering").
    pub fn submit(&self, request: Request) -> Response {
        self.request_tx.send(request).expect("GPG worker thread has exited");
        self.response_rx.recv().expect("GPG worker thread has exited")
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        // Dropping request_tx unblocks the worker's recv with a Disconnected
        // error, which it treats as its exit signal.
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

/// Spawns the GPG worker on its own OS thread, owning `session`
/// exclusively for its lifetime (spec.md section 5, "ACS flags and error
/// counters -- mutated only by the worker").
pub fn spawn(mut session: Session) -> WorkerHandle {
    let (request_tx, request_rx) = channel::<Request>();
    let (response_tx, response_rx) = channel::<Response>();

    let join = std::thread::spawn(move || {
        run(&mut session, &request_rx, &response_tx);
    });

    WorkerHandle { request_tx, response_rx, join: Some(join) }
}

fn run(session: &mut Session, request_rx: &Receiver<Request>, response_tx: &Sender<Response>) {
    loop {
        log::trace!("GPG worker waiting for next command APDU");
        let request = match request_rx.recv() {
            Ok(request) => request,
            Err(_) => {
                log::trace!("GPG worker: transport disconnected, exiting");
                return;
            }
        };

        crate::dispatcher::dispatch(session, &request);

        log::trace!("GPG worker signalling response ready ({} bytes)", session.res.len());
        if response_tx.send(session.res.as_bytes().to_vec()).is_err() {
            return;
        }
    }
}
