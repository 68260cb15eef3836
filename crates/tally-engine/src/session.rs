//! [`ScoringSession`]: the top-level run object.
//!
//! A session owns the [`Registry`] and its [`Dispatcher`], tracks the
//! history counter and lifecycle phase, and writes and reads the
//! session checkpoint stream.
//!
//! # Stream layout
//!
//! ```text
//! [magic "TALY"] [version u8] [histories split] [observer_count u32]
//! ( [name str] [section_len u64] [section bytes] ) x observer_count
//! [checksum u64]
//! ```
//!
//! The checksum is FNV-1a over every preceding byte.

use std::fmt;
use std::io::{Read, Write};

use tally_checkpoint::codec::{
    decode_header, encode_header, read_counter, read_length_prefixed_str, read_u32_le, read_u64_le,
    write_counter, write_length_prefixed_str, write_u32_le, write_u64_le,
};
use tally_checkpoint::{CheckpointError, ChecksumReader, ChecksumWriter};
use tally_core::{EventAction, EventContext, EventKind, HistoryId, ReportSink};
use tally_observer::{Dispatcher, EventHandler, ObserverFactory, Registry};

use crate::config::SessionConfig;
use crate::error::SessionError;

// ── SessionPhase ───────────────────────────────────────────────────

/// Lifecycle phase of a [`ScoringSession`].
///
/// ```text
/// Fresh ──notify──► Running ──store──► (stream)
///   │                  ▲
///   │ restore          │ notify
///   ▼                  │
/// Restored ────────────┘
///
/// Fresh ──add_state──► Merging ──add_state──► Merging
/// any ──reset_counter──► Fresh
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    /// Constructed or reset; no history scored.
    Fresh,
    /// Scoring its own histories.
    Running,
    /// State replaced from a checkpoint, ready to resume.
    Restored,
    /// Accumulating job states for a parallel merge.
    Merging,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fresh => "fresh",
            Self::Running => "running",
            Self::Restored => "restored",
            Self::Merging => "merging",
        };
        f.write_str(name)
    }
}

// ── Stream records ─────────────────────────────────────────────────

/// One observer's section, read but not yet applied.
struct Section {
    name: String,
    bytes: Vec<u8>,
}

/// A fully read and checksum-verified session stream.
struct SessionRecord {
    histories: HistoryId,
    sections: Vec<Section>,
}

fn read_record(r: &mut dyn Read) -> Result<SessionRecord, CheckpointError> {
    let mut input = ChecksumReader::new(r);
    decode_header(&mut input)?;
    let histories = HistoryId(read_counter(&mut input)?);
    let count = read_u32_le(&mut input)?;
    let mut sections = Vec::new();
    for _ in 0..count {
        let name = read_length_prefixed_str(&mut input)?;
        let len = read_u64_le(&mut input)?;
        let mut bytes = Vec::new();
        Read::take(&mut input, len).read_to_end(&mut bytes)?;
        if bytes.len() as u64 != len {
            return Err(CheckpointError::MalformedRecord {
                detail: format!(
                    "section '{name}' truncated: expected {len} bytes, got {}",
                    bytes.len()
                ),
            });
        }
        sections.push(Section { name, bytes });
    }
    let (inner, computed) = input.finish();
    let recorded = read_u64_le(inner)?;
    if recorded != computed {
        return Err(CheckpointError::ChecksumMismatch { recorded, computed });
    }
    Ok(SessionRecord {
        histories,
        sections,
    })
}

// ── ScoringSession ─────────────────────────────────────────────────

/// Registry, dispatcher and history counter of one simulation run.
///
/// # Examples
///
/// ```
/// use tally_core::{CollectingSink, EventContext, EventKind};
/// use tally_engine::{ScoringSession, SessionConfig};
/// use tally_observer::{ObserverDecl, ObserverFactory};
///
/// let config = SessionConfig::new()
///     .with_observer(ObserverDecl::new("dose", "dose_scoring").with("region_count", 1i64));
/// let mut session =
///     ScoringSession::from_config(&config, &ObserverFactory::with_builtins()).unwrap();
///
/// for _ in 0..10 {
///     session.next_history();
///     let ctx = EventContext::in_region(0).with_edep(1.5);
///     session.dispatch(EventKind::BeforeTransport, &ctx);
/// }
///
/// let mut checkpoint = Vec::new();
/// session.store(&mut checkpoint).unwrap();
///
/// let mut sink = CollectingSink::new();
/// session.report_results(&mut sink);
/// assert_eq!(sink.lines[0].value, 1.5);
/// ```
pub struct ScoringSession {
    config: SessionConfig,
    registry: Registry,
    dispatcher: Dispatcher,
    current_case: HistoryId,
    phase: SessionPhase,
}

impl Default for ScoringSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoringSession {
    /// An empty session with no observers and no checkpoint schedule.
    pub fn new() -> Self {
        Self {
            config: SessionConfig::default(),
            registry: Registry::new(),
            dispatcher: Dispatcher::new(),
            current_case: HistoryId::ZERO,
            phase: SessionPhase::Fresh,
        }
    }

    /// Validate `config` and build its observers with `factory`.
    ///
    /// Duplicate names, a zero checkpoint interval and unknown kinds are
    /// all rejected before any observer is constructed.
    pub fn from_config(
        config: &SessionConfig,
        factory: &ObserverFactory,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        config.check_kinds(factory)?;
        let mut session = Self::new();
        session.config = config.clone();
        factory.build_into(&config.observers, &mut session.registry)?;
        session.dispatcher.sync(&session.registry);
        tracing::info!(
            observers = session.registry.count(),
            checkpoint_interval = ?config.checkpoint_interval,
            "scoring session ready"
        );
        Ok(session)
    }

    /// Register an already constructed handler.
    pub fn register(&mut self, handler: Box<dyn EventHandler>) -> Result<usize, SessionError> {
        let index = self.registry.register(handler)?;
        self.dispatcher.sync(&self.registry);
        Ok(index)
    }

    /// The handler registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Handler `name` as its concrete type.
    pub fn handler<T: EventHandler>(&self, name: &str) -> Option<&T> {
        self.registry.lookup(name)?.downcast_ref::<T>()
    }

    /// Mutable handler `name` as its concrete type.
    pub fn handler_mut<T: EventHandler>(&mut self, name: &str) -> Option<&mut T> {
        self.registry.lookup_mut(name)?.downcast_mut::<T>()
    }

    /// The current history counter.
    pub fn current_case(&self) -> HistoryId {
        self.current_case
    }

    /// The lifecycle phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// The configuration the session was built from.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    // ── Scoring ────────────────────────────────────────────────────

    /// Start history `case` in every handler.
    pub fn notify_new_history(&mut self, case: HistoryId) {
        self.current_case = case;
        self.phase = SessionPhase::Running;
        self.dispatcher.notify_new_history(&mut self.registry, case);
    }

    /// Start the history after the current one and return its id.
    pub fn next_history(&mut self) -> HistoryId {
        let case = self.current_case.next();
        self.notify_new_history(case);
        case
    }

    /// Route one event to every interested handler.
    pub fn dispatch(&mut self, kind: EventKind, ctx: &EventContext) -> EventAction {
        self.dispatcher.dispatch(&mut self.registry, kind, ctx)
    }

    /// [`dispatch`](Self::dispatch) with a region override.
    pub fn dispatch_in_region(
        &mut self,
        kind: EventKind,
        ctx: &EventContext,
        region: i32,
    ) -> EventAction {
        self.dispatcher
            .dispatch_in_region(&mut self.registry, kind, ctx, region)
    }

    /// Whether any handler wants events of `kind`.
    pub fn any_interest(&self, kind: EventKind) -> bool {
        self.dispatcher.any_interest(kind)
    }

    /// Registry indices of the handlers routed for `kind`.
    pub fn interested(&self, kind: EventKind) -> &[usize] {
        self.dispatcher.interested(kind)
    }

    /// Whether the configured schedule calls for a checkpoint now.
    pub fn checkpoint_due(&self) -> bool {
        self.config.should_checkpoint(self.current_case)
    }

    // ── Checkpointing ──────────────────────────────────────────────

    /// Write the session checkpoint stream to `w`.
    ///
    /// A history in progress is stored as if complete, so store at a
    /// history boundary.
    pub fn store(&self, w: &mut dyn Write) -> Result<(), SessionError> {
        let mut out = ChecksumWriter::new(w);
        encode_header(&mut out)?;
        write_counter(&mut out, self.current_case.0)?;
        let count =
            u32::try_from(self.registry.count()).map_err(|_| CheckpointError::MalformedRecord {
                detail: format!("{} observers exceed u32::MAX", self.registry.count()),
            })?;
        write_u32_le(&mut out, count)?;
        let mut section = Vec::new();
        for handler in self.registry.iter() {
            section.clear();
            handler.store_state(&mut section)?;
            write_length_prefixed_str(&mut out, handler.name())?;
            write_u64_le(&mut out, section.len() as u64)?;
            out.write_all(&section).map_err(CheckpointError::from)?;
        }
        let (inner, checksum) = out.finish();
        write_u64_le(inner, checksum)?;
        tracing::info!(
            histories = self.current_case.0,
            observers = count,
            "stored scoring session"
        );
        Ok(())
    }

    /// Observer sections must match the registry one to one, in order.
    fn check_sections(&self, record: &SessionRecord) -> Result<(), CheckpointError> {
        if record.sections.len() != self.registry.count() {
            return Err(CheckpointError::MalformedRecord {
                detail: format!(
                    "stream holds {} observer sections, session has {} observers",
                    record.sections.len(),
                    self.registry.count()
                ),
            });
        }
        for (section, name) in record.sections.iter().zip(self.registry.names()) {
            if section.name != name {
                return Err(CheckpointError::ObserverMismatch {
                    expected: name.to_string(),
                    found: section.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Feed each section to its handler through `apply`, requiring the
    /// handler to consume the whole section.
    fn apply_sections(
        &mut self,
        record: &SessionRecord,
        apply: fn(&mut (dyn EventHandler + 'static), &mut dyn Read) -> Result<(), CheckpointError>,
    ) -> Result<(), CheckpointError> {
        for (handler, section) in self.registry.iter_mut().zip(&record.sections) {
            let mut bytes = section.bytes.as_slice();
            apply(handler, &mut bytes)?;
            if !bytes.is_empty() {
                return Err(CheckpointError::MalformedRecord {
                    detail: format!(
                        "observer '{}' left {} bytes of its section unread",
                        section.name,
                        bytes.len()
                    ),
                });
            }
        }
        Ok(())
    }

    /// Replace the session state with a stored stream, to resume a run.
    ///
    /// The whole stream is read and verified before any handler changes.
    pub fn restore(&mut self, r: &mut dyn Read) -> Result<(), SessionError> {
        let record = read_record(r)?;
        self.check_sections(&record)?;
        self.apply_sections(&record, |h, r| h.set_state(r))?;
        self.current_case = record.histories;
        self.phase = SessionPhase::Restored;
        tracing::info!(
            histories = self.current_case.0,
            observers = record.sections.len(),
            "restored scoring session"
        );
        Ok(())
    }

    /// Fold the stored stream of an independent job into this session.
    ///
    /// Only allowed on a [`Fresh`](SessionPhase::Fresh) or
    /// [`Merging`](SessionPhase::Merging) session.
    pub fn add_state(&mut self, r: &mut dyn Read) -> Result<(), SessionError> {
        match self.phase {
            SessionPhase::Fresh | SessionPhase::Merging => {}
            phase => return Err(SessionError::MergeIntoLiveSession { phase }),
        }
        let record = read_record(r)?;
        self.check_sections(&record)?;
        self.apply_sections(&record, |h, r| h.add_state(r))?;
        self.current_case = HistoryId(self.current_case.0 + record.histories.0);
        self.phase = SessionPhase::Merging;
        Ok(())
    }

    /// Return every handler and the counter to the just-built state.
    pub fn reset_counter(&mut self) {
        for handler in self.registry.iter_mut() {
            handler.reset_counter();
        }
        self.current_case = HistoryId::ZERO;
        self.phase = SessionPhase::Fresh;
    }

    /// Merge the checkpoint streams of independent jobs.
    ///
    /// Resets the session, folds in each source in order, and returns
    /// the total number of histories.
    pub fn combine_results<R, I>(&mut self, sources: I) -> Result<u64, SessionError>
    where
        R: Read,
        I: IntoIterator<Item = R>,
    {
        self.reset_counter();
        for (job, mut source) in sources.into_iter().enumerate() {
            let before = self.current_case.0;
            self.add_state(&mut source)?;
            tracing::info!(
                job,
                histories = self.current_case.0 - before,
                total = self.current_case.0,
                "merged job results"
            );
        }
        Ok(self.current_case.0)
    }

    /// Ask every handler to report, in registration order.
    pub fn report_results(&self, sink: &mut dyn ReportSink) {
        for handler in self.registry.iter() {
            handler.report_results(sink);
        }
    }
}

impl fmt::Debug for ScoringSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScoringSession")
            .field("registry", &self.registry)
            .field("current_case", &self.current_case)
            .field("phase", &self.phase)
            .finish()
    }
}
