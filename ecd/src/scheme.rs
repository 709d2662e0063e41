use std::sync::Arc;

use common::io::Pio;
use ecd::files::OpenFiles;
use ecd::{Controller, Expose, Handle};
use redox_scheme::scheme::SchemeSync;
use redox_scheme::{CallerCtx, OpenResult, RequestKind, SignalBehavior, Socket};
use syscall::schemev2::NewFdFlags;
use syscall::{Error, Result, Stat, MODE_FILE};

/// The `ec<N>` scheme of one controller. Its only file is the register space itself.
pub struct EcScheme {
    name: String,
    handle: Handle<Pio<u8>>,
    files: OpenFiles,
}

impl EcScheme {
    pub fn new(controller: &Arc<Controller<Pio<u8>>>) -> Self {
        EcScheme {
            name: controller.name(),
            handle: Handle::new(controller),
            files: OpenFiles::new(),
        }
    }

    pub fn on_close(&mut self, id: usize) {
        self.files.close(id);
    }
}

impl SchemeSync for EcScheme {
    fn open(&mut self, path: &str, flags: usize, ctx: &CallerCtx) -> Result<OpenResult> {
        let id = self.files.open(path, flags, ctx.uid)?;
        Ok(OpenResult::ThisScheme {
            number: id,
            flags: NewFdFlags::POSITIONED,
        })
    }

    fn read(
        &mut self,
        id: usize,
        buf: &mut [u8],
        offset: u64,
        _fcntl_flags: u32,
        _ctx: &CallerCtx,
    ) -> Result<usize> {
        self.files.check(id)?;
        Ok(self.handle.read(offset, buf)?)
    }

    fn write(
        &mut self,
        id: usize,
        buf: &[u8],
        offset: u64,
        _fcntl_flags: u32,
        _ctx: &CallerCtx,
    ) -> Result<usize> {
        self.files.check_writable(id)?;
        Ok(self.handle.write(offset, buf)?)
    }

    fn fstat(&mut self, id: usize, stat: &mut Stat, _ctx: &CallerCtx) -> Result<()> {
        self.files.check(id)?;
        stat.st_mode = MODE_FILE | 0o644;
        stat.st_size = ecd::EC_SPACE_SIZE as u64;
        Ok(())
    }

    fn fpath(&mut self, id: usize, buf: &mut [u8], _ctx: &CallerCtx) -> Result<usize> {
        self.files.check(id)?;
        let path = format!("/scheme/{}", self.name);
        let len = path.len().min(buf.len());
        buf[..len].copy_from_slice(&path.as_bytes()[..len]);
        Ok(len)
    }

    fn fsync(&mut self, id: usize, _ctx: &CallerCtx) -> Result<()> {
        self.files.check(id)
    }
}

/// A mounted controller scheme. Dropping it unmounts the scheme.
pub struct Exposed {
    socket: Socket,
    scheme: EcScheme,
}

impl Exposed {
    /// Serves requests until the scheme is unmounted. Blocks the calling thread, so each
    /// controller is served from a thread of its own.
    pub fn serve(&mut self) {
        loop {
            let request = match self.socket.next_request(SignalBehavior::Restart) {
                Ok(Some(request)) => request,
                Ok(None) => break,
                Err(err) => panic!("ecd: failed to read {} scheme: {:?}", self.scheme.name, err),
            };

            match request.kind() {
                RequestKind::Call(call) => {
                    let response = call.handle_sync(&mut self.scheme);
                    self.socket
                        .write_response(response, SignalBehavior::Restart)
                        .expect("ecd: failed to write scheme response");
                }
                RequestKind::OnClose { id } => self.scheme.on_close(id),
                _ => (),
            }
        }
    }
}

/// Mounts one `ec<N>` scheme per controller.
pub struct SchemeExposer;

impl Expose<Pio<u8>> for SchemeExposer {
    type Resource = Exposed;
    type Error = Error;

    fn expose(&mut self, controller: &Arc<Controller<Pio<u8>>>) -> Result<Exposed> {
        let socket = Socket::create(&controller.name())?;
        Ok(Exposed {
            socket,
            scheme: EcScheme::new(controller),
        })
    }
}
