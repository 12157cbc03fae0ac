use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Chat model used for moderation
pub const MODERATION_MODEL: &str = "gpt-4o-mini";
/// Sampling temperature for moderation requests
pub const MODERATION_TEMPERATURE: f32 = 0.3;

/// Moderation policy sent as the system message.
///
/// Part of the wire contract: the interpreter relies on the JSON answer shape
/// requested in the last line.
pub const MODERATION_POLICY: &str = "Ты модератор контента.
Пост должен не содержать спама, рекламы или неприемлемого контента и соответствовать законам РФ и правилам российского интернета.
Проверь следующий текст на соответствие законодательству Российской Федерации, включая:
1. Федеральные законы:
№ 149-ФЗ «Об информации, информационных технологиях и о защите информации»
№ 114-ФЗ «О противодействии экстремистской деятельности»
№ 436-ФЗ «О защите детей от информации, причиняющей вред их здоровью и развитию»
Закон о фейках, дискредитации ВС РФ и «СВО»
2. Требования Роскомнадзора:
Запрещённая информация: призывы к насилию, самоубийству, распространение наркотиков, порнография, ЛГБТ-пропаганда, фейки, оскорбления госсимволов, экстремизм.
3. Упоминание запрещённых в России ресурсов и организаций:
Соцсети и компании, признанные экстремистскими (например, Meta*, Facebook*, Instagram*)
Сайты, заблокированные в РФ (например, Navalny.com*, Ходорковский Live*, Tor, ProtonVPN и пр.)
Торрент-сайты, даркнет, инструкции по обходу блокировок
Формат ответа:
Укажи, есть ли нарушения.
Если есть — процитируй проблемные фрагменты, уточни, какие именно законы или нормы они нарушают.
Если нарушений нет — напиши: «Нарушений не выявлено».
Дай ответ в формате JSON: {\"approved\": true/false, \"reason\": \"причина одобрения или отклонения развернуто\"}";

/// One moderation request as it goes over the wire
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModerationRequest {
    pub model: String,
    pub temperature: f32,
    pub system_prompt: String,
    pub user_prompt: String,
}

impl ModerationRequest {
    /// Build the fixed request for a post. Model, temperature and policy are
    /// not caller-configurable.
    pub fn for_post(title: &str, content: &str) -> Self {
        Self {
            model: MODERATION_MODEL.to_string(),
            temperature: MODERATION_TEMPERATURE,
            system_prompt: MODERATION_POLICY.to_string(),
            user_prompt: format!("Заголовок: {title}\n\nСодержание: {content}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("moderation API key is not configured")]
    MissingCredentials,
    #[error("network error: {0}")]
    Network(String),
    #[error("moderation service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("moderation request timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },
    #[error("malformed moderation response: {0}")]
    MalformedResponse(String),
}

/// Sends a moderation request and returns the raw response text.
///
/// Implementations own the wire protocol (HTTP, auth, framing). They must not
/// interpret the response; that is the orchestrator's job.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ModerationTransport: Send + Sync {
    async fn complete(&self, request: &ModerationRequest) -> Result<String, TransportError>;
}
