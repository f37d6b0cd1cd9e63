//! Test doubles for the collaborator traits.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use courier_core::{
    BotIdentity, Chat, ChatAction, ChatContext, ChatFlow, ChatMessage, ChatProvider, ChatRole,
    ChatType, HistoryItem, HttpFetcher, HttpRequest, HttpResponse, ImageProvider, MemoryStore,
    MenuRegistrar, MenuRequest, MessageSender, PhotoSource, ProviderResolver, ProviderResult,
    RoleResolver, SendOutcome, Session, Settings, ShareContext, TransportResult, User, UserConfig,
};

use crate::dispatcher::Services;

pub const BOT_TOKEN: &str = "42:secret";
pub const CHAT_ID: i64 = -100;
pub const SPEAKER_ID: i64 = 7;

pub fn message(kind: ChatType, text: &str) -> ChatMessage {
    ChatMessage::text(
        Chat {
            id: CHAT_ID,
            kind,
            title: None,
            username: None,
        },
        text,
    )
    .with_from(User {
        id: SPEAKER_ID,
        is_bot: false,
        first_name: "Tester".into(),
        username: None,
    })
}

pub fn share_context(kind: ChatType) -> ShareContext {
    ShareContext::new(
        &message(kind, ""),
        &BotIdentity::from_token(BOT_TOKEN),
        true,
    )
}

pub fn session(kind: ChatType, settings: &Settings) -> Session {
    Session::new(
        &message(kind, ""),
        &BotIdentity::from_token(BOT_TOKEN),
        settings,
    )
}

// =============================================================================
// Sender
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Text { chat: ChatContext, text: String },
    Photo { chat: ChatContext, photo: PhotoSource },
    Action { chat: ChatContext, action: ChatAction },
}

#[derive(Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<Sent>>,
    photo_outcome: Mutex<Option<SendOutcome>>,
}

impl RecordingSender {
    /// Makes every photo send report `outcome`.
    pub fn fail_photos(&self, outcome: SendOutcome) {
        *self.photo_outcome.lock() = Some(outcome);
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().clone()
    }

    /// Texts sent so far.
    pub fn texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .filter_map(|s| match s {
                Sent::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn last_text(&self) -> Option<String> {
        self.texts().pop()
    }
}

#[async_trait]
impl MessageSender for RecordingSender {
    async fn send_text(&self, chat: &ChatContext, text: &str) -> SendOutcome {
        self.sent.lock().push(Sent::Text {
            chat: chat.clone(),
            text: text.to_string(),
        });
        SendOutcome::delivered(text)
    }

    async fn send_photo(&self, chat: &ChatContext, photo: PhotoSource) -> SendOutcome {
        self.sent.lock().push(Sent::Photo {
            chat: chat.clone(),
            photo,
        });
        self.photo_outcome
            .lock()
            .clone()
            .unwrap_or_else(|| SendOutcome::delivered("photo"))
    }

    async fn send_chat_action(&self, chat: &ChatContext, action: ChatAction) -> SendOutcome {
        self.sent.lock().push(Sent::Action {
            chat: chat.clone(),
            action,
        });
        SendOutcome::delivered("action")
    }
}

// =============================================================================
// Roles
// =============================================================================

pub struct ScriptedRoles {
    role: Option<ChatRole>,
    calls: AtomicUsize,
}

impl ScriptedRoles {
    pub fn new(role: Option<ChatRole>) -> Self {
        Self {
            role,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RoleResolver for ScriptedRoles {
    async fn resolve_role(&self, _share: &ShareContext) -> Option<ChatRole> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.role
    }
}

// =============================================================================
// HTTP
// =============================================================================

/// Answers every request with the same response and records the requests.
pub struct CannedFetcher {
    response: HttpResponse,
    requests: Mutex<Vec<HttpRequest>>,
}

impl CannedFetcher {
    pub fn new(status: u16, content_type: Option<&str>, body: Vec<u8>) -> Self {
        Self {
            response: HttpResponse {
                status,
                status_text: if (200..300).contains(&status) {
                    "OK".into()
                } else {
                    "Error".into()
                },
                content_type: content_type.map(str::to_string),
                body,
            },
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn json(status: u16, body: Value) -> Self {
        Self::new(status, Some("application/json"), body.to_string().into_bytes())
    }

    pub fn text(status: u16, body: &str) -> Self {
        Self::new(status, Some("text/plain"), body.as_bytes().to_vec())
    }

    pub fn bytes(status: u16, body: Vec<u8>) -> Self {
        Self::new(status, Some("image/png"), body)
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl HttpFetcher for CannedFetcher {
    async fn fetch(&self, request: HttpRequest) -> TransportResult<HttpResponse> {
        self.requests.lock().push(request);
        Ok(self.response.clone())
    }
}

// =============================================================================
// Menu
// =============================================================================

#[derive(Default)]
pub struct RecordingRegistrar {
    requests: Mutex<Vec<MenuRequest>>,
}

impl RecordingRegistrar {
    pub fn requests(&self) -> Vec<MenuRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl MenuRegistrar for RecordingRegistrar {
    async fn set_my_commands(&self, request: &MenuRequest) -> TransportResult<Value> {
        self.requests.lock().push(request.clone());
        Ok(serde_json::json!({"ok": true, "result": true}))
    }
}

// =============================================================================
// Providers and chat flow
// =============================================================================

pub struct FakeChat;

impl ChatProvider for FakeChat {
    fn name(&self) -> &str {
        "openai"
    }

    fn model_key(&self) -> &str {
        "OPENAI_CHAT_MODEL"
    }

    fn model(&self, config: &UserConfig) -> Option<String> {
        config.get_str(self.model_key()).map(str::to_string)
    }
}

pub struct FakeImage {
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl ImageProvider for FakeImage {
    fn name(&self) -> &str {
        "dalle"
    }

    fn model_key(&self) -> &str {
        "DALL_E_MODEL"
    }

    fn model(&self, config: &UserConfig) -> Option<String> {
        config.get_str(self.model_key()).map(str::to_string)
    }

    async fn request(&self, prompt: &str, _config: &UserConfig) -> ProviderResult<PhotoSource> {
        self.prompts.lock().push(prompt.to_string());
        Ok(PhotoSource::Url(format!("https://img.test/{}", prompt.len())))
    }
}

/// Resolves a fixed chat provider and, optionally, an image provider.
pub struct FakeProviders {
    chat: Arc<FakeChat>,
    image: Option<Arc<FakeImage>>,
}

impl FakeProviders {
    pub fn new(with_image: bool) -> Self {
        Self {
            chat: Arc::new(FakeChat),
            image: with_image.then(|| {
                Arc::new(FakeImage {
                    prompts: Mutex::new(Vec::new()),
                })
            }),
        }
    }

    pub fn image_prompts(&self) -> Vec<String> {
        self.image
            .as_ref()
            .map(|i| i.prompts.lock().clone())
            .unwrap_or_default()
    }
}

impl ProviderResolver for FakeProviders {
    fn chat_provider(&self, _config: &UserConfig) -> Option<Arc<dyn ChatProvider>> {
        Some(Arc::clone(&self.chat) as Arc<dyn ChatProvider>)
    }

    fn image_provider(&self, _config: &UserConfig) -> Option<Arc<dyn ImageProvider>> {
        self.image
            .as_ref()
            .map(|i| Arc::clone(i) as Arc<dyn ImageProvider>)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatCall {
    pub history: Vec<HistoryItem>,
    pub message: Option<String>,
}

#[derive(Default)]
pub struct RecordingChatFlow {
    calls: Mutex<Vec<ChatCall>>,
}

impl RecordingChatFlow {
    pub fn calls(&self) -> Vec<ChatCall> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl ChatFlow for RecordingChatFlow {
    async fn chat(
        &self,
        _session: &mut Session,
        history: Vec<HistoryItem>,
        message: Option<String>,
    ) -> ProviderResult<SendOutcome> {
        self.calls.lock().push(ChatCall { history, message });
        Ok(SendOutcome::delivered("chat"))
    }
}

// =============================================================================
// Harness
// =============================================================================

/// Every double wired into a [`Services`] value, with typed handles kept
/// for assertions.
pub struct Harness {
    pub sender: Arc<RecordingSender>,
    pub store: Arc<MemoryStore>,
    pub roles: Arc<ScriptedRoles>,
    pub providers: Arc<FakeProviders>,
    pub fetcher: Arc<CannedFetcher>,
    pub chat_flow: Arc<RecordingChatFlow>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(
            Some(ChatRole::Member),
            CannedFetcher::json(200, serde_json::json!({})),
        )
    }

    pub fn with(role: Option<ChatRole>, fetcher: CannedFetcher) -> Self {
        Self {
            sender: Arc::new(RecordingSender::default()),
            store: Arc::new(MemoryStore::new()),
            roles: Arc::new(ScriptedRoles::new(role)),
            providers: Arc::new(FakeProviders::new(true)),
            fetcher: Arc::new(fetcher),
            chat_flow: Arc::new(RecordingChatFlow::default()),
        }
    }

    pub fn without_image_provider(mut self) -> Self {
        self.providers = Arc::new(FakeProviders::new(false));
        self
    }

    pub fn services(&self) -> Services {
        Services {
            sender: self.sender.clone(),
            store: self.store.clone(),
            roles: self.roles.clone(),
            providers: self.providers.clone(),
            fetcher: self.fetcher.clone(),
            chat_flow: self.chat_flow.clone(),
        }
    }
}
