use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::thread;

use common::io::Io;
use log::{debug, error, info};

use crate::controller::{Controller, Handle, Ports};
use crate::ec::Ec;
use crate::error::{Error, Result};

pub const MAX_EC_DEVICES: usize = 8;

/// Where controllers are found: one optional primary followed by a finite chain of others.
pub trait Discovery {
    type Io: Io<Value = u8>;

    fn primary(&mut self) -> Option<Ports>;

    fn secondaries(&mut self) -> Box<dyn Iterator<Item = Ports> + '_>;

    /// Builds the protocol engine for the controller at `ports`.
    fn connect(&mut self, ports: Ports) -> Ec<Self::Io>;
}

/// Makes a registered controller reachable from outside, such as through a scheme.
///
/// Dropping the resource revokes it.
pub trait Expose<I: Io<Value = u8>> {
    type Resource;
    type Error: fmt::Display;

    fn expose(&mut self, controller: &Arc<Controller<I>>) -> Result<Self::Resource, Self::Error>;
}

/// A fixed list of controller locations, the first being the primary.
pub struct PortList<I, F> {
    ports: Vec<Ports>,
    connect: F,
    io: PhantomData<fn() -> I>,
}

impl<I, F> PortList<I, F>
where
    I: Io<Value = u8>,
    F: FnMut(Ports) -> Ec<I>,
{
    pub fn new(ports: Vec<Ports>, connect: F) -> Self {
        PortList {
            ports,
            connect,
            io: PhantomData,
        }
    }
}

impl<I, F> Discovery for PortList<I, F>
where
    I: Io<Value = u8>,
    F: FnMut(Ports) -> Ec<I>,
{
    type Io = I;

    fn primary(&mut self) -> Option<Ports> {
        self.ports.first().copied()
    }

    fn secondaries(&mut self) -> Box<dyn Iterator<Item = Ports> + '_> {
        Box::new(self.ports.iter().skip(1).copied())
    }

    fn connect(&mut self, ports: Ports) -> Ec<I> {
        (self.connect)(ports)
    }
}

pub struct Entry<I: Io<Value = u8>, R> {
    // Revoked before the controller goes away
    resource: R,
    controller: Arc<Controller<I>>,
}

impl<I: Io<Value = u8>, R> Entry<I, R> {
    pub fn controller(&self) -> &Arc<Controller<I>> {
        &self.controller
    }

    pub fn resource(&self) -> &R {
        &self.resource
    }

    pub fn resource_mut(&mut self) -> &mut R {
        &mut self.resource
    }
}

/// All registered controllers, indexed in discovery order.
///
/// The set is fixed once [`Registry::init`] returns; it is only emptied again by
/// [`Registry::shutdown`], which also runs on drop.
pub struct Registry<I: Io<Value = u8>, R> {
    entries: Vec<Entry<I, R>>,
}

impl<I: Io<Value = u8>, R> Registry<I, R> {
    /// Registers the primary controller as `ec0` and then each secondary in order, up to
    /// [`MAX_EC_DEVICES`]. Controllers beyond that are left alone.
    ///
    /// Either every controller is exposed or, on the first failure, every resource created so
    /// far is revoked again in reverse order and nothing stays registered.
    pub fn init<D, E>(discovery: &mut D, exposer: &mut E) -> Result<Self>
    where
        D: Discovery<Io = I>,
        E: Expose<I, Resource = R>,
    {
        let Some(primary) = discovery.primary() else {
            error!("ecd: no EC devices found");
            return Err(Error::NoDevice);
        };

        let mut locations = vec![primary];
        locations.extend(discovery.secondaries().take(MAX_EC_DEVICES - 1));

        let mut registry = Registry {
            entries: Vec::with_capacity(locations.len()),
        };

        for (index, ports) in locations.into_iter().enumerate() {
            let controller = Arc::new(Controller::new(index, ports, discovery.connect(ports)));
            match exposer.expose(&controller) {
                Ok(resource) => {
                    debug!("ecd: created {} at {}", controller.name(), ports);
                    registry.entries.push(Entry {
                        resource,
                        controller,
                    });
                }
                Err(err) => {
                    error!(
                        "ecd: failed to create device for {}: {}",
                        controller.name(),
                        err
                    );
                    registry.shutdown();
                    return Err(Error::ResourceCreationFailed(index));
                }
            }
        }

        info!(
            "ecd: successfully created {} EC device(s)",
            registry.entries.len()
        );
        Ok(registry)
    }

    /// Revokes every exposed resource, most recently registered first.
    pub fn shutdown(&mut self) {
        while let Some(entry) = self.entries.pop() {
            debug!("ecd: removing {}", entry.controller.name());
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Entry<I, R>> {
        self.entries.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Entry<I, R>> {
        self.entries.get_mut(index)
    }

    /// Opens a handle to the controller registered as `index`.
    pub fn open(&self, index: usize) -> Result<Handle<I>> {
        self.get(index)
            .map(|entry| Handle::new(&entry.controller))
            .ok_or(Error::InvalidArgument)
    }

    /// Runs `serve` once per registered controller, each on its own thread, and returns when
    /// all of them have returned. A controller that is slow or stuck only holds up its own
    /// thread.
    pub fn serve<F>(&mut self, serve: F)
    where
        I: Send,
        R: Send,
        F: Fn(&mut Entry<I, R>) + Sync,
    {
        let serve = &serve;
        thread::scope(|scope| {
            for entry in self.entries.iter_mut() {
                scope.spawn(move || serve(entry));
            }
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry<I, R>> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entry<I, R>> {
        self.entries.iter_mut()
    }
}

impl<I: Io<Value = u8>, R> Drop for Registry<I, R> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
