// ── Device state coordinator ──
//
// Lifecycle for one camera or doorbell: periodic refresh ticks driven by
// the planner, the event listener and dispatcher tasks, command execution,
// and the read-side queries consumers poll.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use tokio::sync::{Mutex, broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use dahua_api::event_stream::{AttachStream, ReconnectConfig};
use dahua_api::{Credentials, DahuaClient};

use crate::api::{ApiOperation, DeviceApi};
use crate::clock::{Clock, SystemClock};
use crate::command::Command;
use crate::config::DeviceConfig;
use crate::error::CoreError;
use crate::events::dispatcher::Dispatcher;
use crate::events::{DoorbellSource, FrameSource};
use crate::model::{
    CapabilityFlag, DeviceClass, DeviceIdentity, DeviceProfile, EventRecord, ProfileMode,
};
use crate::refresh::planner::RefreshPlanner;
use crate::store::{EventTimestamps, Listener, ListenerTable, SnapshotStore, StateSnapshot};

const EVENT_CHANNEL_SIZE: usize = 256;
const FRAME_CHANNEL_SIZE: usize = 64;

// ── UpdateStatus ─────────────────────────────────────────────────

/// Outcome of the most recent refresh tick, observable by consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateStatus {
    /// No tick has completed yet.
    Pending,
    Ok { at: i64 },
    Failed { at: i64, message: String },
}

// ── EventSources ─────────────────────────────────────────────────

/// Event producers, one per device class. Only the source matching the
/// detected class is started.
#[derive(Default, Clone)]
pub struct EventSources {
    pub camera: Option<Arc<dyn FrameSource>>,
    pub doorbell: Option<Arc<dyn DoorbellSource>>,
}

// ── Coordinator ──────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<CoordinatorInner>`. Does nothing until
/// [`start()`](Self::start) or [`refresh()`](Self::refresh) is called.
pub struct Coordinator<A: DeviceApi> {
    inner: Arc<CoordinatorInner<A>>,
}

impl<A: DeviceApi> Clone for Coordinator<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct CoordinatorInner<A> {
    api: A,
    configured_name: Option<String>,
    events: Vec<String>,
    poll_interval: Duration,
    sources: EventSources,
    clock: Arc<dyn Clock>,

    planner: Mutex<RefreshPlanner>,
    snapshot: SnapshotStore,
    profile: ArcSwap<DeviceProfile>,
    display_name: Arc<ArcSwap<String>>,
    timestamps: Arc<EventTimestamps>,
    listeners: Arc<ListenerTable>,
    event_tx: broadcast::Sender<Arc<EventRecord>>,
    update_status: watch::Sender<UpdateStatus>,

    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Coordinator<DahuaClient> {
    /// Build a coordinator for a real device: CGI client plus the camera
    /// attach stream for the configured events.
    ///
    /// Doorbell events need a doorbell source; use
    /// [`Coordinator::with_sources`] to supply one.
    pub fn from_config(config: &DeviceConfig) -> Result<Self, CoreError> {
        let transport = config.transport();
        let credentials = Credentials {
            username: config.username.clone(),
            password: config.password.clone(),
        };
        let client = DahuaClient::new(config.url.clone(), credentials, config.rtsp_port, &transport)?;
        let stream = AttachStream::new(
            client.clone(),
            &config.events,
            &transport,
            ReconnectConfig::default(),
        )?;

        let sources = EventSources {
            camera: Some(Arc::new(stream)),
            doorbell: None,
        };
        Ok(Self::with_sources(client, config, sources))
    }
}

impl<A: DeviceApi> Coordinator<A> {
    pub fn with_sources(api: A, config: &DeviceConfig, sources: EventSources) -> Self {
        Self::with_clock(api, config, sources, Arc::new(SystemClock))
    }

    pub fn with_clock(
        api: A,
        config: &DeviceConfig,
        sources: EventSources,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        let (update_status, _) = watch::channel(UpdateStatus::Pending);
        let initial_name = config.name.clone().unwrap_or_default();

        Self {
            inner: Arc::new(CoordinatorInner {
                api,
                configured_name: config.name.clone(),
                events: config.events.clone(),
                poll_interval: config.poll_interval,
                sources,
                clock,
                planner: Mutex::new(RefreshPlanner::new()),
                snapshot: SnapshotStore::new(),
                profile: ArcSwap::from_pointee(DeviceProfile::default()),
                display_name: Arc::new(ArcSwap::from_pointee(initial_name)),
                timestamps: Arc::new(EventTimestamps::new()),
                listeners: Arc::new(ListenerTable::new()),
                event_tx,
                update_status,
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    /// The underlying device API.
    pub fn api(&self) -> &A {
        &self.inner.api
    }

    /// Verify the credentials with a single identity fetch. Touches no
    /// coordinator state.
    pub async fn check_credentials(&self) -> Result<DeviceIdentity, CoreError> {
        let api = &self.inner.api;
        let (name, info) = tokio::try_join!(
            api.fetch(ApiOperation::MachineName),
            api.fetch(ApiOperation::SystemInfo),
        )?;
        let identity = DeviceIdentity {
            machine_name: name
                .get("table.General.MachineName")
                .cloned()
                .unwrap_or_default(),
            serial_number: info.get("serialNumber").cloned().unwrap_or_default(),
        };
        debug!(machine_name = %identity.machine_name, "credentials accepted");
        Ok(identity)
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Run the first refresh tick, then spawn the periodic refresh task.
    ///
    /// If the first tick fails the coordinator is stopped and the error
    /// returned.
    pub async fn start(&self) -> Result<(), CoreError> {
        if let Err(e) = self.refresh().await {
            self.stop().await;
            return Err(e);
        }

        let interval = self.inner.poll_interval;
        if !interval.is_zero() {
            let coordinator = self.clone();
            let cancel = self.inner.cancel.clone();
            self.inner
                .task_handles
                .lock()
                .await
                .push(tokio::spawn(refresh_task(coordinator, interval, cancel)));
        }

        info!(name = %self.device_name(), "coordinator started");
        Ok(())
    }

    /// Stop the refresh task, event listeners and dispatcher, and wait for
    /// them. No event is dispatched after this returns.
    pub async fn stop(&self) {
        self.inner.cancel.cancel();

        // Release the lock before joining; a tick in flight may still push.
        let handles = std::mem::take(&mut *self.inner.task_handles.lock().await);
        for handle in handles {
            let _ = handle.await;
        }
        debug!("coordinator stopped");
    }

    /// Run one refresh tick and publish the resulting snapshot.
    ///
    /// Ticks never overlap. A failed tick keeps the previous snapshot.
    pub async fn refresh(&self) -> Result<Arc<StateSnapshot>, CoreError> {
        if self.inner.cancel.is_cancelled() {
            return Err(CoreError::Stopped);
        }

        let mut planner = self.inner.planner.lock().await;
        let result = planner.tick(&self.inner.api).await;

        self.inner.profile.store(Arc::new(planner.profile().clone()));
        self.update_display_name(&planner.profile().machine_name);
        let listener = planner.take_listener_request();

        let now = self.inner.clock.now();
        let outcome = match result {
            Ok(data) => {
                let snapshot = self.inner.snapshot.publish(data);
                self.inner.update_status.send_replace(UpdateStatus::Ok { at: now });
                debug!(keys = snapshot.len(), "device state refreshed");
                Ok(snapshot)
            }
            Err(e) => {
                warn!(error = %e, "failed to sync device state");
                self.inner.update_status.send_replace(UpdateStatus::Failed {
                    at: now,
                    message: e.to_string(),
                });
                Err(CoreError::update_failed(e))
            }
        };
        drop(planner);

        if let Some(class) = listener {
            self.start_event_listener(class).await;
        }

        outcome
    }

    /// Execute a device write, then refresh.
    pub async fn execute(&self, command: Command) -> Result<Arc<StateSnapshot>, CoreError> {
        if self.inner.cancel.is_cancelled() {
            return Err(CoreError::Stopped);
        }

        let profile = self.profile();
        if matches!(command, Command::SetInfraredMode { .. })
            && !profile.model.is_empty()
            && !profile.supports_infrared_light()
        {
            return Err(CoreError::Unsupported {
                operation: command.name().into(),
                required: "a model with an infrared light".into(),
            });
        }

        debug!(command = command.name(), "executing command");
        self.inner
            .api
            .fetch(command.operation(profile.profile_mode))
            .await?;
        self.refresh().await
    }

    // ── Event listeners ──────────────────────────────────────────

    /// Register the callback for an event code. Replaces any previous one.
    pub fn register_listener<F>(&self, code: impl Into<String>, listener: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        let listener: Listener = Arc::new(listener);
        self.inner.listeners.register(code, listener);
    }

    /// Epoch seconds the event became active, or 0.
    pub fn event_timestamp(&self, code: &str) -> i64 {
        self.inner.timestamps.get(code)
    }

    /// Subscribe to every decoded event.
    pub fn events(&self) -> broadcast::Receiver<Arc<EventRecord>> {
        self.inner.event_tx.subscribe()
    }

    /// Subscribe to refresh outcomes.
    pub fn update_status(&self) -> watch::Receiver<UpdateStatus> {
        self.inner.update_status.subscribe()
    }

    async fn start_event_listener(&self, class: DeviceClass) {
        let cancel = self.inner.cancel.clone();
        if cancel.is_cancelled() {
            return;
        }
        let (frame_tx, frame_rx) = mpsc::channel(FRAME_CHANNEL_SIZE);
        let (doorbell_tx, doorbell_rx) = mpsc::channel(FRAME_CHANNEL_SIZE);

        let mut handles = self.inner.task_handles.lock().await;

        match class {
            DeviceClass::Camera => match &self.inner.sources.camera {
                Some(source) => {
                    info!(events = ?self.inner.events, "starting camera event listener");
                    handles.push(source.spawn(frame_tx, cancel.clone()));
                }
                None => warn!("no camera event source configured"),
            },
            DeviceClass::Doorbell => match &self.inner.sources.doorbell {
                Some(source) => {
                    info!("starting doorbell event listener");
                    handles.push(source.spawn(doorbell_tx, cancel.clone()));
                }
                None => warn!("doorbell events need a doorbell source, none configured"),
            },
        }

        let dispatcher = Dispatcher {
            timestamps: Arc::clone(&self.inner.timestamps),
            listeners: Arc::clone(&self.inner.listeners),
            bus: self.inner.event_tx.clone(),
            clock: Arc::clone(&self.inner.clock),
            display_name: Arc::clone(&self.inner.display_name),
        };
        handles.push(tokio::spawn(dispatcher.run(frame_rx, doorbell_rx, cancel)));
    }

    fn update_display_name(&self, machine_name: &str) {
        let name = self
            .inner
            .configured_name
            .clone()
            .unwrap_or_else(|| machine_name.to_owned());
        if **self.inner.display_name.load() != name {
            self.inner.display_name.store(Arc::new(name));
        }
    }

    // ── Device info ──────────────────────────────────────────────

    /// The latest published snapshot.
    pub fn snapshot(&self) -> Arc<StateSnapshot> {
        self.inner.snapshot.load()
    }

    pub fn profile(&self) -> Arc<DeviceProfile> {
        self.inner.profile.load_full()
    }

    /// Configured name, or the device's machine name.
    pub fn device_name(&self) -> String {
        self.inner.display_name.load().as_str().to_owned()
    }

    pub fn model(&self) -> String {
        self.profile().model.clone()
    }

    pub fn serial_number(&self) -> String {
        self.profile().serial_number.clone()
    }

    pub fn firmware_version(&self) -> Option<String> {
        self.snapshot().firmware_version().map(str::to_owned)
    }

    /// Event codes the camera listener subscribes to.
    pub fn event_list(&self) -> &[String] {
        &self.inner.events
    }

    pub fn profile_mode(&self) -> ProfileMode {
        self.profile().profile_mode
    }

    // ── Capability queries ───────────────────────────────────────

    pub fn is_doorbell(&self) -> bool {
        self.profile().class().is_doorbell()
    }

    pub fn supports_coaxial_control(&self) -> bool {
        self.profile().capabilities.coaxial_control == CapabilityFlag::Supported
    }

    pub fn supports_disarming_linkage(&self) -> bool {
        self.profile().capabilities.disarming_linkage == CapabilityFlag::Supported
    }

    pub fn supports_profile_mode(&self) -> bool {
        self.profile().capabilities.profile_mode == CapabilityFlag::Supported
    }

    pub fn supports_siren(&self) -> bool {
        self.profile().supports_siren()
    }

    pub fn supports_security_light(&self) -> bool {
        self.profile().supports_security_light()
    }

    pub fn supports_infrared_light(&self) -> bool {
        self.profile().supports_infrared_light()
    }

    pub fn supports_illuminator(&self) -> bool {
        self.snapshot().supports_illuminator()
    }

    // ── Snapshot-derived state ───────────────────────────────────

    pub fn is_motion_detection_enabled(&self) -> bool {
        self.snapshot().motion_detection_enabled()
    }

    pub fn is_disarming_linkage_enabled(&self) -> bool {
        self.snapshot().disarming_linkage_enabled()
    }

    pub fn is_siren_on(&self) -> bool {
        self.snapshot().siren_on()
    }

    pub fn is_security_light_on(&self) -> bool {
        self.snapshot().security_light_on()
    }

    pub fn is_infrared_light_on(&self) -> bool {
        self.snapshot().infrared_light_on(self.profile_mode())
    }

    /// 0..=255.
    pub fn infrared_brightness(&self) -> u8 {
        self.snapshot().infrared_brightness(self.profile_mode())
    }

    pub fn is_illuminator_on(&self) -> bool {
        self.snapshot().illuminator_on(self.profile_mode())
    }

    /// 0..=255.
    pub fn illuminator_brightness(&self) -> u8 {
        self.snapshot().illuminator_brightness()
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Periodically refresh device state.
async fn refresh_task<A: DeviceApi>(
    coordinator: Coordinator<A>,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                // Failures are logged and reported on the status channel.
                let _ = coordinator.refresh().await;
            }
        }
    }
}
