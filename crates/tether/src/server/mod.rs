//! Serving side: hosts a dispatch table behind a listening socket.
//!
//! A [`Server`] accepts one connection at a time. Each connection is
//! authenticated and served until the client disconnects, after which the
//! server listens for the next one; a `close` command ends the cycle for good
//! and releases the socket. Further clients queue in the socket backlog while
//! one is being served.

mod banner;
mod errors;
mod session;

use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::thread;

use tether_config::{Config, Endpoint, Secret};
use tracing::{Span, info, info_span, warn};

use self::banner::Banner;
use self::session::Outcome;
use crate::binder::Proxy;
use crate::dispatch::{DispatchTable, Function, RegistrationError};
use crate::transport::{Listener, auth};

pub use self::errors::ServerError;

pub(crate) const SERVER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::server");

/// Options for [`Server::run`] and [`Server::spawn`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Writes the start-up banner to stderr once listening.
    pub banner: bool,
}

impl RunOptions {
    /// Enables the start-up banner.
    #[must_use]
    pub const fn with_banner(mut self) -> Self {
        self.banner = true;
        self
    }
}

/// RPC server owning a dispatch table.
///
/// ```rust,no_run
/// use serde_json::json;
/// use tether::{Function, RunOptions, Server, Signature};
/// use tether_config::Config;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut server = Server::new(&Config::server().with_secret("abc"));
/// let square = Function::new("square", |args| {
///     let x: i64 = args.get(0, "x")?;
///     Ok(json!(x * x))
/// })
/// .with_signature(Signature::new().required("x"));
/// server.register(square, None)?;
/// server.run(RunOptions::default().with_banner())?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Server {
    endpoint: Endpoint,
    secret: Option<Secret>,
    table: DispatchTable,
    listener: Option<Listener>,
    bound: Option<SocketAddr>,
    span: Span,
}

impl Server {
    /// Creates a server for the configured endpoint and secret.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let span = info_span!(
            target: SERVER_TARGET,
            "server",
            endpoint = %config.endpoint
        );
        Self {
            endpoint: config.endpoint.clone(),
            secret: config.secret.clone(),
            table: DispatchTable::new(),
            listener: None,
            bound: None,
            span,
        }
    }

    /// Registers a free function. See [`DispatchTable::register`].
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::AnonymousFunction`] for unnamed functions
    /// registered without a name.
    pub fn register(
        &mut self,
        function: Function,
        name: Option<&str>,
    ) -> Result<bool, RegistrationError> {
        let _entered = self.span.enter();
        self.table.register(function, name)
    }

    /// Registers a live instance. See [`DispatchTable::register_instance`].
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::InstanceAlreadyRegistered`] when the
    /// instance is already registered.
    pub fn register_instance<T: Proxy>(
        &mut self,
        instance: &Arc<Mutex<T>>,
        prefix: Option<&str>,
    ) -> Result<bool, RegistrationError> {
        let _entered = self.span.enter();
        self.table.register_instance(instance, prefix)
    }

    /// Removes a command by name.
    pub fn unregister(&mut self, name: &str) -> bool {
        let _entered = self.span.enter();
        self.table.unregister(name)
    }

    /// Removes a function by its own name.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::AnonymousFunction`] for unnamed functions.
    pub fn unregister_function(&mut self, function: &Function) -> Result<bool, RegistrationError> {
        let _entered = self.span.enter();
        self.table.unregister_function(function)
    }

    /// Removes every command an instance contributed.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::InstanceNotRegistered`] for unknown
    /// instances.
    pub fn unregister_instance<T: Proxy>(
        &mut self,
        instance: &Arc<Mutex<T>>,
    ) -> Result<bool, RegistrationError> {
        self.table.unregister_instance(instance)
    }

    /// Whether a user command of this name exists.
    #[must_use]
    pub fn has_registered(&self, name: &str) -> bool {
        self.table.has_registered(name)
    }

    /// Registered user commands, accessors included.
    #[must_use]
    pub fn commands(&self) -> Vec<&str> {
        self.table.commands().collect()
    }

    /// Properties exposed by registered instances.
    #[must_use]
    pub fn properties(&self) -> Vec<&str> {
        self.table.properties()
    }

    /// Class names of registered instances.
    #[must_use]
    pub fn instances(&self) -> Vec<&'static str> {
        self.table.class_names()
    }

    /// The dispatch table.
    #[must_use]
    pub const fn table(&self) -> &DispatchTable {
        &self.table
    }

    /// Configured endpoint, with the bound port once listening.
    #[must_use]
    pub fn endpoint(&self) -> Endpoint {
        match self.bound {
            Some(addr) => self.endpoint.with_port(addr.port()),
            None => self.endpoint.clone(),
        }
    }

    /// Address of the most recent bind.
    #[must_use]
    pub const fn local_addr(&self) -> Option<SocketAddr> {
        self.bound
    }

    /// Binds the listening socket without accepting.
    ///
    /// Binding port 0 picks an ephemeral port, which every later re-listen
    /// reuses.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Listener`] when the endpoint cannot be resolved
    /// or bound.
    pub fn listen(&mut self) -> Result<SocketAddr, ServerError> {
        let listener = self.take_listener()?;
        let addr = listener.local_addr()?;
        self.listener = Some(listener);
        Ok(addr)
    }

    fn take_listener(&mut self) -> Result<Listener, ServerError> {
        if let Some(listener) = self.listener.take() {
            return Ok(listener);
        }
        let _entered = self.span.enter();
        let listener = Listener::bind(&self.endpoint())?;
        let addr = listener.local_addr()?;
        info!(target: SERVER_TARGET, %addr, "listening");
        self.bound = Some(addr);
        Ok(listener)
    }

    /// Serves clients on the calling thread until one sends `close`.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when listening fails or the banner cannot be
    /// written. Failures of individual connections are logged and followed by
    /// a new listen.
    pub fn run(&mut self, options: RunOptions) -> Result<(), ServerError> {
        let span = self.span.clone();
        let _entered = span.enter();
        let addr = self.listen()?;
        if options.banner {
            self.write_banner(addr, &mut io::stderr().lock())?;
        }

        loop {
            let listener = self.take_listener()?;
            let accepted = listener.accept();
            self.listener = Some(listener);
            let (mut stream, peer) = accepted?;
            info!(target: SERVER_TARGET, %peer, "client connected");

            if let Err(error) = auth::challenge_peer(&mut stream, self.secret.as_ref()) {
                warn!(target: SERVER_TARGET, %peer, %error, "handshake failed");
                stream.shutdown();
                continue;
            }

            match session::serve(&mut stream, &self.table) {
                Ok(Outcome::Closed) => {
                    self.listener = None;
                    info!(target: SERVER_TARGET, "server terminated");
                    return Ok(());
                }
                Ok(Outcome::Disconnected) => {}
                Err(error) => {
                    warn!(target: SERVER_TARGET, %peer, %error, "connection failed");
                    stream.shutdown();
                }
            }
        }
    }

    /// Runs the server on a background thread.
    ///
    /// The socket is bound before this returns, so clients may connect to
    /// [`ServerHandle::local_addr`] immediately.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when binding or spawning the thread fails.
    pub fn spawn(mut self, options: RunOptions) -> Result<ServerHandle, ServerError> {
        let addr = self.listen()?;
        let handle = thread::Builder::new()
            .name("tether-server".to_owned())
            .spawn(move || self.run(options).map(|()| self))
            .map_err(ServerError::Spawn)?;
        Ok(ServerHandle { addr, handle })
    }

    /// The start-up banner text.
    #[must_use]
    pub fn help_server(&self) -> String {
        self.banner(self.bound.unwrap_or_else(|| {
            SocketAddr::from(([0, 0, 0, 0], self.endpoint.port()))
        }))
        .render()
    }

    fn banner(&self, address: SocketAddr) -> Banner<'_> {
        Banner {
            address,
            all_interfaces: self.endpoint.is_all_interfaces(),
            secret: self.secret.as_ref(),
            table: &self.table,
        }
    }

    fn write_banner(&self, addr: SocketAddr, writer: &mut impl io::Write) -> Result<(), ServerError> {
        self.banner(addr)
            .write_to(writer)
            .map_err(ServerError::Banner)
    }
}

impl fmt::Display for Server {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "Server({}) [{}]",
            self.endpoint(),
            self.table.class_names().join(", ")
        )
    }
}

/// A server running on a background thread.
#[derive(Debug)]
pub struct ServerHandle {
    addr: SocketAddr,
    handle: thread::JoinHandle<Result<Server, ServerError>>,
}

impl ServerHandle {
    /// Address the server is bound to.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Whether the server has stopped.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the server to stop and hands it back.
    ///
    /// # Errors
    ///
    /// Returns the error that stopped the server, or
    /// [`ServerError::ThreadPanic`] if its thread panicked.
    pub fn join(self) -> Result<Server, ServerError> {
        self.handle
            .join()
            .map_err(|_| ServerError::ThreadPanic)?
    }
}
