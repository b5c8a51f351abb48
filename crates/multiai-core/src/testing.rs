//! In-crate fakes for the frame and workspace seams.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::command::{CommandOutcome, FrameCommand};
use crate::error::FrameError;
use crate::frame::FrameContext;
use crate::workspace::{FrameSlot, FrameSpec, Workspace, WorkspaceBackend};

/// How a fake frame answers one kind of command.
#[derive(Debug, Clone)]
pub(crate) enum Behaviour {
    Outcome(CommandOutcome),
    Fail,
    Hang,
}

pub(crate) struct FakeFrame {
    id: String,
    url: Mutex<String>,
    inject: Mutex<Behaviour>,
    send: Mutex<Behaviour>,
    replies: Mutex<VecDeque<Option<String>>>,
    last_reply: Mutex<Option<String>>,
    read_fails: AtomicBool,
    matches: AtomicUsize,
    log: Mutex<Vec<FrameCommand>>,
}

impl FakeFrame {
    pub fn new(id: &str, url: &str) -> Self {
        Self {
            id: id.to_string(),
            url: Mutex::new(url.to_string()),
            inject: Mutex::new(Behaviour::Outcome(CommandOutcome::Done)),
            send: Mutex::new(Behaviour::Outcome(CommandOutcome::Done)),
            replies: Mutex::new(VecDeque::new()),
            last_reply: Mutex::new(None),
            read_fails: AtomicBool::new(false),
            matches: AtomicUsize::new(0),
            log: Mutex::new(Vec::new()),
        }
    }

    pub fn set_url(&self, url: &str) {
        *self.url.lock().unwrap() = url.to_string();
    }

    pub fn on_inject(self, behaviour: Behaviour) -> Self {
        *self.inject.lock().unwrap() = behaviour;
        self
    }

    pub fn on_send(self, behaviour: Behaviour) -> Self {
        *self.send.lock().unwrap() = behaviour;
        self
    }

    /// Texts returned by successive `ReadLast` commands. The last one repeats.
    pub fn with_replies(self, replies: &[Option<&str>]) -> Self {
        *self.replies.lock().unwrap() = replies.iter().map(|r| r.map(str::to_string)).collect();
        self
    }

    pub fn with_reply(self, reply: &str) -> Self {
        *self.last_reply.lock().unwrap() = Some(reply.to_string());
        self
    }

    pub fn failing_reads(self) -> Self {
        self.read_fails.store(true, Ordering::SeqCst);
        self
    }

    pub fn with_matches(self, count: usize) -> Self {
        self.matches.store(count, Ordering::SeqCst);
        self
    }

    pub fn commands(&self) -> Vec<FrameCommand> {
        self.log.lock().unwrap().clone()
    }

    async fn respond(behaviour: Behaviour) -> Result<CommandOutcome, FrameError> {
        match behaviour {
            Behaviour::Outcome(outcome) => Ok(outcome),
            Behaviour::Fail => Err(FrameError::Script("boom".to_string())),
            Behaviour::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(CommandOutcome::Done)
            }
        }
    }
}

#[async_trait]
impl FrameContext for FakeFrame {
    fn id(&self) -> &str {
        &self.id
    }

    async fn current_url(&self) -> Result<String, FrameError> {
        Ok(self.url.lock().unwrap().clone())
    }

    async fn execute(&self, command: &FrameCommand) -> Result<CommandOutcome, FrameError> {
        self.log.lock().unwrap().push(command.clone());
        match command {
            FrameCommand::Inject { .. } => {
                let behaviour = self.inject.lock().unwrap().clone();
                Self::respond(behaviour).await
            }
            FrameCommand::Send { .. } => {
                let behaviour = self.send.lock().unwrap().clone();
                Self::respond(behaviour).await
            }
            FrameCommand::ReadLast { .. } => {
                if self.read_fails.load(Ordering::SeqCst) {
                    return Err(FrameError::Script("read failed".to_string()));
                }
                let mut last = self.last_reply.lock().unwrap();
                if let Some(next) = self.replies.lock().unwrap().pop_front() {
                    *last = next;
                }
                Ok(CommandOutcome::Text(last.clone()))
            }
            FrameCommand::Highlight { .. } => {
                Ok(CommandOutcome::Matched(self.matches.load(Ordering::SeqCst)))
            }
        }
    }
}

pub(crate) struct FakeBackend {
    live: AtomicBool,
    opened: AtomicUsize,
    shows: AtomicUsize,
    failing: Mutex<Vec<String>>,
    prepared: Mutex<HashMap<String, Arc<FakeFrame>>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            live: AtomicBool::new(true),
            opened: AtomicUsize::new(0),
            shows: AtomicUsize::new(0),
            failing: Mutex::new(Vec::new()),
            prepared: Mutex::new(HashMap::new()),
        }
    }

    /// Hand out `frame` when `url` is opened.
    pub fn prepare(&self, url: &str, frame: Arc<FakeFrame>) {
        self.prepared.lock().unwrap().insert(url.to_string(), frame);
    }

    pub fn set_live(&self, live: bool) {
        self.live.store(live, Ordering::SeqCst);
    }

    pub fn fail_url(&self, url: &str) {
        self.failing.lock().unwrap().push(url.to_string());
    }

    pub fn opened_count(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn show_count(&self) -> usize {
        self.shows.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WorkspaceBackend for FakeBackend {
    async fn open_frame(&self, spec: &FrameSpec) -> Result<Arc<dyn FrameContext>, FrameError> {
        if self.failing.lock().unwrap().contains(&spec.url) {
            return Err(FrameError::Backend(format!("cannot open {}", spec.url)));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        self.live.store(true, Ordering::SeqCst);
        if let Some(frame) = self.prepared.lock().unwrap().get(&spec.url) {
            return Ok(frame.clone());
        }
        let id = format!("fake_{}", spec.index);
        Ok(Arc::new(FakeFrame::new(&id, &spec.url)))
    }

    async fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    async fn show(&self) -> Result<(), FrameError> {
        self.shows.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&self) -> Result<(), FrameError> {
        self.live.store(false, Ordering::SeqCst);
        Ok(())
    }
}

/// A live workspace over the given frames, named after their position.
pub(crate) fn workspace_of(frames: Vec<Arc<FakeFrame>>) -> (Workspace, Arc<FakeBackend>) {
    let backend = Arc::new(FakeBackend::new());
    let slots = frames
        .into_iter()
        .enumerate()
        .map(|(index, frame)| FrameSlot {
            spec: FrameSpec {
                index,
                display_name: format!("Frame {}", index),
                url: String::new(),
            },
            context: frame,
        })
        .collect();
    (Workspace::new(slots, backend.clone()), backend)
}
