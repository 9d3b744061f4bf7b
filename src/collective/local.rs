//! In-process rank group: one OS thread per rank, channels between them.

use super::{Communicator, ReduceOp};
use crate::error::{Error, Result};
use crate::executor::catch_panic;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::thread;
use std::time::Duration;

#[derive(Debug)]
enum Payload {
    Block(Vec<u64>),
    Scalar(u64),
    Abort(String),
}

#[derive(Debug)]
struct Envelope {
    seq: u64,
    from: usize,
    payload: Payload,
}

/// Launches a fixed number of ranks and hands each its communicator.
#[derive(Debug, Clone)]
pub struct LocalGroup {
    size: usize,
    timeout: Option<Duration>,
    thread_name_prefix: String,
}

impl LocalGroup {
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(Error::config("group needs at least 1 rank"));
        }
        Ok(Self {
            size,
            timeout: None,
            thread_name_prefix: "parsum-rank".to_string(),
        })
    }

    /// Fail receives that wait longer than `timeout` instead of blocking forever.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Wired-up communicators, index = rank.
    pub fn communicators(&self) -> Vec<LocalCommunicator> {
        let (senders, receivers): (Vec<_>, Vec<_>) = (0..self.size).map(|_| unbounded()).unzip();

        receivers
            .into_iter()
            .enumerate()
            .map(|(rank, inbox)| LocalCommunicator {
                rank,
                size: self.size,
                peers: senders.clone(),
                inbox,
                stash: RefCell::new(HashMap::new()),
                seq: Cell::new(0),
                timeout: self.timeout,
            })
            .collect()
    }

    /// Runs `f` on every rank concurrently and returns the results in rank order.
    ///
    /// A panicking rank aborts its peers' pending collectives and the whole
    /// run fails with `Error::WorkerPanic`.
    pub fn run<F, R>(&self, f: F) -> Result<Vec<R>>
    where
        F: Fn(&LocalCommunicator) -> R + Sync,
        R: Send,
    {
        let f = &f;

        thread::scope(|s| {
            let comms = self.communicators();
            let peers = comms[0].peers.clone();
            let mut handles = Vec::with_capacity(self.size);
            for comm in comms {
                let rank = comm.rank;
                let name = format!("{}-{}", self.thread_name_prefix, rank);
                let spawned = thread::Builder::new()
                    .name(name)
                    .spawn_scoped(s, move || {
                        let outcome = catch_panic(|| f(&comm));
                        if let Err(info) = &outcome {
                            tracing::error!(rank = comm.rank, "rank panicked: {}", info.message);
                            comm.abort(&info.message);
                        }
                        outcome
                    });
                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(e) => {
                        // unblock ranks that already started
                        for peer in &peers {
                            let _ = peer.send(Envelope {
                                seq: u64::MAX,
                                from: rank,
                                payload: Payload::Abort("peer failed to start".to_string()),
                            });
                        }
                        return Err(Error::executor(format!("spawn failed: {}", e)));
                    }
                }
            }

            let mut results = Vec::with_capacity(self.size);
            let mut panics = Vec::new();
            for (rank, handle) in handles.into_iter().enumerate() {
                match handle.join() {
                    Ok(Ok(value)) => results.push(value),
                    Ok(Err(info)) => panics.push(format!("rank {}: {}", rank, info.message)),
                    Err(_) => panics.push(format!("rank {}: thread died", rank)),
                }
            }

            if panics.is_empty() {
                Ok(results)
            } else {
                Err(Error::WorkerPanic(panics.join("; ")))
            }
        })
    }
}

/// One rank's endpoint. Collectives must be called in the same order on
/// every rank of the group.
pub struct LocalCommunicator {
    rank: usize,
    size: usize,
    peers: Vec<Sender<Envelope>>,
    inbox: Receiver<Envelope>,
    // messages that arrived ahead of the collective waiting for them
    stash: RefCell<HashMap<(u64, usize), Payload>>,
    seq: Cell<u64>,
    timeout: Option<Duration>,
}

impl LocalCommunicator {
    fn next_seq(&self) -> u64 {
        let seq = self.seq.get() + 1;
        self.seq.set(seq);
        seq
    }

    fn check_root(&self, root: usize) -> Result<()> {
        if root >= self.size {
            return Err(Error::collective(format!(
                "root {} out of range for group of {}",
                root, self.size
            )));
        }
        Ok(())
    }

    fn send(&self, to: usize, seq: u64, payload: Payload) -> Result<()> {
        self.peers[to]
            .send(Envelope {
                seq,
                from: self.rank,
                payload,
            })
            .map_err(|_| Error::collective(format!("rank {} is gone", to)))
    }

    fn recv_from(&self, seq: u64, from: usize) -> Result<Payload> {
        if let Some(payload) = self.stash.borrow_mut().remove(&(seq, from)) {
            return Ok(payload);
        }

        loop {
            let envelope = match self.timeout {
                Some(timeout) => self.inbox.recv_timeout(timeout).map_err(|e| match e {
                    RecvTimeoutError::Timeout => Error::collective(format!(
                        "rank {} timed out waiting for rank {}",
                        self.rank, from
                    )),
                    RecvTimeoutError::Disconnected => Error::collective("group disconnected"),
                })?,
                None => self
                    .inbox
                    .recv()
                    .map_err(|_| Error::collective("group disconnected"))?,
            };

            if let Payload::Abort(reason) = envelope.payload {
                return Err(Error::collective(format!(
                    "rank {} aborted: {}",
                    envelope.from, reason
                )));
            }

            if envelope.seq == seq && envelope.from == from {
                return Ok(envelope.payload);
            }
            self.stash
                .borrow_mut()
                .insert((envelope.seq, envelope.from), envelope.payload);
        }
    }

    fn recv_block(&self, seq: u64, from: usize, expected_len: Option<usize>) -> Result<Vec<u64>> {
        match self.recv_from(seq, from)? {
            Payload::Block(block) => match expected_len {
                Some(len) if block.len() != len => Err(Error::collective(format!(
                    "rank {} sent {} values, expected {}",
                    from,
                    block.len(),
                    len
                ))),
                _ => Ok(block),
            },
            other => Err(Error::collective(format!(
                "expected a block from rank {}, got {:?}",
                from, other
            ))),
        }
    }

    fn recv_scalar(&self, seq: u64, from: usize) -> Result<u64> {
        match self.recv_from(seq, from)? {
            Payload::Scalar(value) => Ok(value),
            other => Err(Error::collective(format!(
                "expected a scalar from rank {}, got {:?}",
                from, other
            ))),
        }
    }

    /// Tells every other rank to give up on pending collectives.
    fn abort(&self, reason: &str) {
        for to in (0..self.size).filter(|&r| r != self.rank) {
            let _ = self.send(to, u64::MAX, Payload::Abort(reason.to_string()));
        }
    }
}

impl LocalCommunicator {
    /// Passes `result` through, first aborting the peers if it is an error.
    ///
    /// Used on the root, whose peers would otherwise keep waiting on it.
    fn abort_on_err<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            tracing::warn!(rank = self.rank, error = %e, "collective failed on root");
            self.abort(&e.to_string());
        }
        result
    }

    fn scatter_root(&self, seq: u64, send: Option<&[u64]>, block_len: usize) -> Result<Vec<u64>> {
        let buffer = send.ok_or_else(|| Error::collective("root must supply the scatter buffer"))?;
        if buffer.len() != block_len * self.size {
            return Err(Error::collective(format!(
                "scatter buffer holds {} values, expected {} blocks of {}",
                buffer.len(),
                self.size,
                block_len
            )));
        }

        let mut own = Vec::new();
        for to in 0..self.size {
            let block = buffer[to * block_len..(to + 1) * block_len].to_vec();
            if to == self.rank {
                own = block;
            } else {
                self.send(to, seq, Payload::Block(block))?;
            }
        }

        Ok(own)
    }

    fn gather_root(&self, seq: u64, send: &[u64]) -> Result<Vec<u64>> {
        let mut gathered = Vec::with_capacity(send.len() * self.size);
        for from in 0..self.size {
            if from == self.rank {
                gathered.extend_from_slice(send);
            } else {
                gathered.extend(self.recv_block(seq, from, Some(send.len()))?);
            }
        }
        Ok(gathered)
    }

    fn reduce_root(&self, seq: u64, value: u64, op: ReduceOp) -> Result<u64> {
        let mut acc = value;
        for from in (0..self.size).filter(|&r| r != self.rank) {
            let v = self.recv_scalar(seq, from)?;
            acc = op.apply(acc, v)?;
        }
        Ok(acc)
    }
}

impl Communicator for LocalCommunicator {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn scatter(&self, root: usize, send: Option<&[u64]>, block_len: usize) -> Result<Vec<u64>> {
        self.check_root(root)?;
        let seq = self.next_seq();

        if self.rank != root {
            return self.recv_block(seq, root, Some(block_len));
        }
        self.abort_on_err(self.scatter_root(seq, send, block_len))
    }

    fn gather(&self, root: usize, send: &[u64]) -> Result<Option<Vec<u64>>> {
        self.check_root(root)?;
        let seq = self.next_seq();

        if self.rank != root {
            self.send(root, seq, Payload::Block(send.to_vec()))?;
            return Ok(None);
        }
        self.abort_on_err(self.gather_root(seq, send)).map(Some)
    }

    fn reduce(&self, root: usize, value: u64, op: ReduceOp) -> Result<Option<u64>> {
        self.check_root(root)?;
        let seq = self.next_seq();

        if self.rank != root {
            self.send(root, seq, Payload::Scalar(value))?;
            return Ok(None);
        }
        self.abort_on_err(self.reduce_root(seq, value, op)).map(Some)
    }
}

impl std::fmt::Debug for LocalCommunicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalCommunicator")
            .field("rank", &self.rank)
            .field("size", &self.size)
            .field("seq", &self.seq.get())
            .finish()
    }
}
