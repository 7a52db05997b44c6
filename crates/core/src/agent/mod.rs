use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::dispatch::WILDCARD;
use crate::{
    ControlLoop, Dispatcher, Enforcer, LivenessProbe, ParameterStore, PipelineConfig, Result,
    Settings, UdpTransport, WatchEngine,
};

/// Runtime context built once at startup: the bound socket, the validated
/// rule set and the shared parameter state.
#[derive(Debug)]
pub struct Agent {
    settings: Settings,
    config: PipelineConfig,
    transport: Arc<UdpTransport>,
    engine: Arc<WatchEngine>,
}

impl Agent {
    /// Loads the pipeline named by `settings.config_path`, then binds. A
    /// configuration that fails to load or validate returns before any socket
    /// is opened.
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let config = PipelineConfig::load(&settings.config_path).map_err(|err| {
            tracing::error!(path = ?settings.config_path, error = %err, "failed to load config");
            err
        })?;
        Self::bind(settings, config).map_err(|err| {
            tracing::error!(error = %err, "failed to bind local UDP port");
            err
        })
    }

    /// Binds the local socket. Fails if the address cannot be bound.
    pub fn bind(settings: Settings, config: PipelineConfig) -> Result<Self> {
        let transport = Arc::new(UdpTransport::bind(
            settings.bind_addr(),
            settings.mixer_addr(),
        )?);
        let engine = Arc::new(WatchEngine::new(
            transport.clone(),
            ParameterStore::new(),
            settings.cascade_delay,
        ));
        tracing::info!(
            local = %transport.local_addr()?,
            mixer = %transport.target(),
            "listening"
        );

        Ok(Self {
            settings,
            config,
            transport,
            engine,
        })
    }

    /// Address the receive thread listens on.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// Last observed values of the watched parameters.
    pub fn store(&self) -> &ParameterStore {
        self.engine.store()
    }

    /// Handlers for every watched parameter plus a wildcard tracer.
    pub fn dispatcher(&self) -> Dispatcher {
        let mut dispatcher = Dispatcher::new();
        self.engine.install(&mut dispatcher, &self.config.watched);
        dispatcher.register(WILDCARD, |message| {
            tracing::debug!(address = %message.addr, args = ?message.args, "received OSC message");
        });
        dispatcher
    }

    /// Main cycle over the watched addresses and the enforced baseline.
    pub fn control_loop(&self) -> ControlLoop {
        ControlLoop::new(
            self.transport.clone(),
            LivenessProbe::default(),
            self.config.watched.iter().map(|w| w.address.clone()).collect(),
            Enforcer::new(self.config.enforced.clone()),
        )
        .with_timing(self.settings.poll_interval, self.settings.probe_backoff)
    }

    /// Starts the receive thread.
    pub fn start(&self) -> Result<JoinHandle<()>> {
        self.transport.spawn_receiver(self.dispatcher())
    }

    /// Starts the receive thread and runs the control loop forever.
    pub fn run(&self) -> Result<()> {
        self.start()?;
        self.control_loop().run()
    }
}
