#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mudae_claims::{ClaimCorrelator, Transport, TransportError};
use mudae_core::config::MUDAE_BOT_ID;
use mudae_core::{
    ChannelId, Embed, MessageId, MessageParser, MessageRef, MudaeSettings, ParseContext,
    RawMessage, Reaction, UserId, UserRef, Waifu,
};
use mudae_events::{EventBus, TransportEvent};

/// Our own account in every test.
pub const SELF_ID: u64 = 99;

/// Channel all test rolls are posted in.
pub const CHANNEL: u64 = 7;

pub fn test_context() -> ParseContext {
    ParseContext::new(UserId(MUDAE_BOT_ID), UserId(SELF_ID))
}

pub fn bot() -> UserRef {
    UserRef::new(MUDAE_BOT_ID, "Mudae")
}

pub fn me() -> UserRef {
    UserRef::new(SELF_ID, "me")
}

pub fn alice() -> UserRef {
    UserRef::new(10, "alice")
}

pub fn bob() -> UserRef {
    UserRef::new(11, "bob")
}

/// A bot message with a single character embed.
pub fn roll_message(id: u64, name: &str, content: &str) -> RawMessage {
    RawMessage {
        id: MessageId(id),
        channel_id: ChannelId(CHANNEL),
        author: bot(),
        content: content.to_string(),
        embeds: vec![Embed {
            author_name: Some(name.to_string()),
            description: Some(
                "Fate/stay night\n**120**<:kakera:469835869059153940>\nReact with any emoji to claim!"
                    .to_string(),
            ),
            color: Some(0xFF9D2C),
            ..Default::default()
        }],
        mentions: vec![],
        interaction_user: None,
        referenced_message: None,
    }
}

/// A roll the bot already shows as owned by `owner`.
pub fn claimed_roll_message(id: u64, name: &str, owner: &str) -> RawMessage {
    let mut message = roll_message(id, name, "");
    message.embeds[0].color = Some(mudae_core::config::CLAIMED_COLOR);
    message.embeds[0].footer = Some(format!("Belongs to {owner}"));
    message
}

/// Parse a fresh roll through the real parser.
pub fn roll(id: u64, name: &str) -> Waifu {
    MessageParser::new(test_context())
        .parse(&roll_message(id, name, ""))
        .expect("test roll should parse")
}

/// Plain chat message from `author`.
pub fn chat(id: u64, author: UserRef, content: &str) -> RawMessage {
    RawMessage {
        id: MessageId(id),
        channel_id: ChannelId(CHANNEL),
        author,
        content: content.to_string(),
        embeds: vec![],
        mentions: vec![],
        interaction_user: None,
        referenced_message: None,
    }
}

pub fn confirmation_text(user: &str, name: &str) -> String {
    format!("💖 **{user}** and **{name}** are now married! 💖")
}

/// In-memory [`Transport`] with scripted responses.
#[derive(Default)]
pub struct MockTransport {
    pub reactions: Mutex<HashMap<MessageRef, Vec<Reaction>>>,
    /// Newest first.
    pub history: Mutex<Vec<RawMessage>>,
    pub members: Mutex<Vec<UserRef>>,
    pub sent: Mutex<Vec<(MessageRef, String)>>,
    pub fail_send: AtomicBool,
    /// `send_reaction` never completes.
    pub hang_send: AtomicBool,
    /// `member_named` never completes.
    pub hang_member_lookup: AtomicBool,
    pub calls: AtomicUsize,
    /// Published on `bus` right after a reaction is sent.
    pub reply_on_send: Mutex<Option<(Arc<EventBus>, TransportEvent)>>,
}

impl MockTransport {
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn sent_reactions(&self) -> Vec<(MessageRef, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get_reactions(&self, message: MessageRef) -> Result<Vec<Reaction>, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .reactions
            .lock()
            .unwrap()
            .get(&message)
            .cloned()
            .unwrap_or_default())
    }

    async fn send_reaction(&self, message: MessageRef, marker: &str) -> Result<(), TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.hang_send.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail_send.load(Ordering::SeqCst) {
            return Err(TransportError::Request("missing permissions".to_string()));
        }
        self.sent.lock().unwrap().push((message, marker.to_string()));
        if let Some((bus, event)) = self.reply_on_send.lock().unwrap().take() {
            bus.publish(event);
        }
        Ok(())
    }

    async fn recent_messages(
        &self,
        _channel: ChannelId,
        limit: usize,
    ) -> Result<Vec<RawMessage>, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.history.lock().unwrap().iter().take(limit).cloned().collect())
    }

    async fn member_named(
        &self,
        _channel: ChannelId,
        name: &str,
    ) -> Result<Option<UserRef>, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.hang_member_lookup.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        Ok(self
            .members
            .lock()
            .unwrap()
            .iter()
            .find(|member| member.name == name)
            .cloned())
    }
}

/// Correlator wired to a fresh bus and mock transport.
pub struct Harness {
    pub transport: Arc<MockTransport>,
    pub bus: Arc<EventBus>,
    pub correlator: Arc<ClaimCorrelator>,
}

pub fn harness() -> Harness {
    let transport = Arc::new(MockTransport::default());
    let bus = Arc::new(EventBus::default());
    let correlator = Arc::new(ClaimCorrelator::new(
        transport.clone(),
        bus.clone(),
        test_context(),
    ));
    Harness {
        transport,
        bus,
        correlator,
    }
}

/// Correlator built from environment-style settings.
pub fn harness_with_settings(vars: &[(&str, &str)]) -> Harness {
    let transport = Arc::new(MockTransport::default());
    let bus = Arc::new(EventBus::default());
    let settings = MudaeSettings::from_lookup(|key| {
        vars.iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.to_string())
    })
    .expect("test settings should load");
    let correlator = Arc::new(ClaimCorrelator::from_settings(
        transport.clone(),
        bus.clone(),
        settings,
    ));
    Harness {
        transport,
        bus,
        correlator,
    }
}

/// Yield until a watch on `origin` is registered.
pub async fn wait_until_watching(correlator: &ClaimCorrelator, origin: MessageRef) {
    while !correlator.is_watching(origin) {
        tokio::task::yield_now().await;
    }
}
