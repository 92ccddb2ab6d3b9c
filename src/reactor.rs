use crate::completion::{oneshot, Completion, Pending};
use crate::connection::Connection;
use crate::error::TransportError;
use crate::logger::{diag, Sink};
use mio::event::Events;
use mio::{Interest, Poll, Token, Waker};
use std::io::{self, Read, Write};
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Instant;

// Tokens used for the MIO event loop
const WAKER: Token = Token(0);
const SOCKET: Token = Token(1);

pub(crate) type ReadResult = Result<Vec<u8>, TransportError>;

/// Work submitted to the reactor thread
pub(crate) enum Command {
    Attach {
        connection: Connection,
        done: Completion<io::Result<()>>,
    },
    Write {
        bytes: Vec<u8>,
        done: Completion<io::Result<()>>,
    },
    Read {
        len: usize,
        deadline: Option<Instant>,
        done: Completion<ReadResult>,
    },
    Detach {
        done: Completion<()>,
    },
    Stop,
}

/// The caller side of the reactor thread
///
/// Dropping the handle stops the thread and waits for it to exit.
pub(crate) struct ReactorHandle {
    // Doubles as the keep-alive guard: once every sender is gone the loop exits on its own.
    commands: Option<Sender<Command>>,
    waker: Waker,
    thread: Option<JoinHandle<()>>,
}

struct PendingRead {
    buf: Vec<u8>,
    filled: usize,
    deadline: Option<Instant>,
    done: Completion<ReadResult>,
}

struct PendingWrite {
    bytes: Vec<u8>,
    written: usize,
    done: Completion<io::Result<()>>,
}

struct Reactor {
    poll: Poll,
    events: Events,
    commands: Receiver<Command>,
    connection: Option<Connection>,
    read: Option<PendingRead>,
    write: Option<PendingWrite>,
    sink: Sink,
}

enum Flow {
    Continue,
    Stop,
}

impl ReactorHandle {
    // A `std` socket can't be raced against a timer: a blocking read only gives up on its own
    // schedule. Mio lets the reactor thread give up on a read when its deadline passes, and a
    // `Waker` lets callers interrupt `poll()` to hand over new work.
    //
    // Callers never touch the socket. They send a command, wake the poll, and block on the
    // command's one-shot completion until the reactor thread resolves it.
    pub(crate) fn start(sink: Sink) -> Result<Self, io::Error> {
        let poll = Poll::new()?;
        let events = Events::with_capacity(16);
        let waker = Waker::new(poll.registry(), WAKER)?;
        let (tx, rx) = channel();

        let reactor = Reactor {
            poll,
            events,
            commands: rx,
            connection: None,
            read: None,
            write: None,
            sink,
        };

        let thread = thread::Builder::new()
            .name("fastcgi-reactor".into())
            .spawn(move || reactor.run())?;

        Ok(Self {
            commands: Some(tx),
            waker,
            thread: Some(thread),
        })
    }

    /// Hands `command` to the reactor thread
    fn submit(&self, command: Command) -> Result<(), TransportError> {
        let sent = self
            .commands
            .as_ref()
            .map(|commands| commands.send(command).is_ok())
            .unwrap_or(false);

        if !sent {
            return Err(reactor_gone());
        }

        self.waker.wake()?;
        Ok(())
    }

    fn call<T>(&self, command: impl FnOnce(Completion<T>) -> Command) -> Result<T, TransportError> {
        let (done, pending): (Completion<T>, Pending<T>) = oneshot();
        self.submit(command(done))?;
        pending.wait().ok_or_else(reactor_gone)
    }

    pub(crate) fn attach(&self, connection: Connection) -> Result<(), TransportError> {
        self.call(|done| Command::Attach { connection, done })?
            .map_err(TransportError::Io)
    }

    pub(crate) fn write(&self, bytes: Vec<u8>) -> Result<(), TransportError> {
        self.call(|done| Command::Write { bytes, done })?
            .map_err(TransportError::Io)
    }

    pub(crate) fn read(&self, len: usize, deadline: Option<Instant>) -> ReadResult {
        self.call(|done| Command::Read {
            len,
            deadline,
            done,
        })?
    }

    pub(crate) fn detach(&self) -> Result<(), TransportError> {
        self.call(|done| Command::Detach { done })
    }
}

impl Drop for ReactorHandle {
    fn drop(&mut self) {
        if let Some(commands) = self.commands.take() {
            let _ = commands.send(Command::Stop);
        }
        let _ = self.waker.wake();

        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn reactor_gone() -> TransportError {
    TransportError::Io(io::Error::new(
        io::ErrorKind::BrokenPipe,
        "the reactor thread is not running",
    ))
}

impl Reactor {
    fn run(mut self) {
        diag!(self.sink, Debug, "fastcgi reactor started");

        loop {
            // The only timer is the deadline of the pending read, if any
            let timeout = self
                .read
                .as_ref()
                .and_then(|read| read.deadline)
                .map(|deadline| deadline.saturating_duration_since(Instant::now()));

            match self.poll.poll(&mut self.events, timeout) {
                Ok(_) => {}
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    diag!(self.sink, Error, error = err; "Poll call failed. Reactor will exit");
                    break;
                }
            }

            if let Flow::Stop = self.drain_commands() {
                break;
            }

            // Socket readiness is edge-triggered, so both directions are simply retried until
            // they would block.
            self.drive_read();
            self.drive_write();
            self.expire_read();
        }

        self.detach();
        diag!(self.sink, Debug, "fastcgi reactor stopped");
    }

    fn drain_commands(&mut self) -> Flow {
        loop {
            let command = match self.commands.try_recv() {
                Ok(command) => command,
                Err(TryRecvError::Empty) => return Flow::Continue,
                Err(TryRecvError::Disconnected) => return Flow::Stop,
            };

            match command {
                Command::Attach { connection, done } => done.resolve(self.attach(connection)),
                Command::Write { bytes, done } => {
                    if self.connection.is_none() {
                        done.resolve(Err(io::ErrorKind::NotConnected.into()));
                        continue;
                    }
                    self.write = Some(PendingWrite {
                        bytes,
                        written: 0,
                        done,
                    });
                }
                Command::Read {
                    len,
                    deadline,
                    done,
                } => {
                    if self.connection.is_none() {
                        done.resolve(Err(TransportError::Closed));
                        continue;
                    }
                    self.read = Some(PendingRead {
                        buf: vec![0; len],
                        filled: 0,
                        deadline,
                        done,
                    });
                }
                Command::Detach { done } => {
                    self.detach();
                    done.resolve(());
                }
                Command::Stop => return Flow::Stop,
            }
        }
    }

    fn attach(&mut self, mut connection: Connection) -> io::Result<()> {
        self.detach();
        self.poll.registry().register(
            &mut connection,
            SOCKET,
            Interest::READABLE | Interest::WRITABLE,
        )?;
        self.connection = Some(connection);
        Ok(())
    }

    // Cancels whatever is in flight, then closes the socket by dropping it.
    fn detach(&mut self) {
        if let Some(read) = self.read.take() {
            read.done.resolve(Err(TransportError::Closed));
        }
        if let Some(write) = self.write.take() {
            write.done.resolve(Err(io::ErrorKind::NotConnected.into()));
        }
        if let Some(mut connection) = self.connection.take() {
            if let Err(err) = self.poll.registry().deregister(&mut connection) {
                diag!(self.sink, Debug, error = err; "Failed to deregister socket");
            }
        }
    }

    fn drive_read(&mut self) {
        let (Some(read), Some(connection)) = (self.read.as_mut(), self.connection.as_mut()) else {
            return;
        };

        let outcome = loop {
            if read.filled == read.buf.len() {
                break Some(Ok(()));
            }

            match connection.read(&mut read.buf[read.filled..]) {
                Ok(0) => break Some(Err(TransportError::Closed)),
                Ok(n) => read.filled += n,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break None,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => break Some(Err(TransportError::Io(e))),
            }
        };

        let Some(outcome) = outcome else {
            return;
        };

        if let Err(err) = &outcome {
            diag!(self.sink, Debug, error = err; "Socket read failed");
        }

        // Resolving wins the race: the deadline goes away with the pending read
        if let Some(read) = self.read.take() {
            read.done.resolve(outcome.map(|()| read.buf));
        }
    }

    fn drive_write(&mut self) {
        let (Some(write), Some(connection)) = (self.write.as_mut(), self.connection.as_mut())
        else {
            return;
        };

        let outcome = loop {
            if write.written == write.bytes.len() {
                break Some(connection.flush());
            }

            match connection.write(&write.bytes[write.written..]) {
                Ok(0) => break Some(Err(io::ErrorKind::WriteZero.into())),
                Ok(n) => write.written += n,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break None,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => break Some(Err(e)),
            }
        };

        let Some(outcome) = outcome else {
            return;
        };

        if let Err(err) = &outcome {
            diag!(self.sink, Debug, error = err; "Socket write failed");
        }

        if let Some(write) = self.write.take() {
            write.done.resolve(outcome);
        }
    }

    // Resolving the timeout cancels the read: whatever it had buffered is dropped with it.
    fn expire_read(&mut self) {
        let expired = self
            .read
            .as_ref()
            .and_then(|read| read.deadline)
            .is_some_and(|deadline| Instant::now() >= deadline);

        if !expired {
            return;
        }

        if let Some(read) = self.read.take() {
            diag!(
                self.sink,
                Debug,
                "Socket read timed out after {} of {} bytes",
                read.filled,
                read.buf.len()
            );
            read.done.resolve(Err(TransportError::Timeout));
        }
    }
}
