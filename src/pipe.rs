use std::fs::File;
use std::os::fd::OwnedFd;
use std::process::{Command, ExitStatus, Stdio};
use std::str::FromStr;

use log::{debug, warn};

use crate::errors::{Result, StreamError};
use crate::stream::Stream;

/// Which half of the child's standard streams the parent keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipeRole {
    /// The stream yields what the child writes to its stdout (`r`).
    Read,
    /// Bytes written to the stream reach the child's stdin (`w`).
    Write,
}

impl FromStr for PipeRole {
    type Err = StreamError;

    fn from_str(spelling: &str) -> std::result::Result<Self, Self::Err> {
        match spelling {
            "r" => Ok(PipeRole::Read),
            "w" => Ok(PipeRole::Write),
            other => Err(StreamError::Mode(other.to_owned())),
        }
    }
}

impl Stream {
    /// Spawn `sh -c command` and expose one of its standard streams as a
    /// buffered stream.
    ///
    /// The requested standard stream of the child is rewired onto an
    /// anonymous pipe; the surplus pipe ends are closed on both sides by
    /// the spawn, and the child's other standard streams are inherited.
    /// A command that cannot be executed surfaces as a child terminating
    /// with a failure status, observed at [`Stream::pipe_close`].
    pub fn pipe_open(command: &str, role: PipeRole) -> Result<Stream> {
        let mut shell = Command::new("sh");
        shell.arg("-c").arg(command);
        match role {
            PipeRole::Read => shell.stdout(Stdio::piped()),
            PipeRole::Write => shell.stdin(Stdio::piped()),
        };

        let mut child = shell.spawn()?;
        let endpoint: OwnedFd = match role {
            PipeRole::Read => child
                .stdout
                .take()
                .expect("stdout was requested piped")
                .into(),
            PipeRole::Write => child
                .stdin
                .take()
                .expect("stdin was requested piped")
                .into(),
        };
        debug!("spawned `{}` as pid {}", command, child.id());

        Ok(Stream::from_parts(File::from(endpoint), Some(child)))
    }

    /// Close the stream, reap the child, and return its exit status.
    ///
    /// The pipe end is released before the wait so a [`PipeRole::Write`]
    /// child observes end-of-file on its stdin. A flush failure during
    /// the close is logged and does not preempt the reap.
    pub fn pipe_close(mut self) -> Result<ExitStatus> {
        let mut child = match self.take_child() {
            Some(child) => child,
            None => return Err(StreamError::NotPiped),
        };
        let pid = child.id();

        if let Err(e) = self.close_inner() {
            warn!("closing pipe stream of child {} failed: {}", pid, e);
        }
        drop(self);

        let status = child.wait()?;
        debug!("child {} exited with {}", pid, status);
        Ok(status)
    }
}
