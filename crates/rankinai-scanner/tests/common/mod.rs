#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rankinai_citation::CitationAnalyzer;
use rankinai_core::{NewProduct, NewScan, Plan, Platform, PricingTable, Product, Shop};
use rankinai_llm::{LlmError, LlmProvider, LlmReply, TokenUsage};
use rankinai_scanner::{EngineSettings, MemoryStore, Providers, ScanEngine};

pub const CITED_REPLY: &str = "Here are my picks:\n1. Manduka PRO\n2. Acme UltraMat Pro\n\
                               I recommend the Acme UltraMat Pro for its excellent grip.";
pub const UNCITED_REPLY: &str = "I recommend a different yoga mat entirely.";
pub const RECOMMENDATION_JSON: &str = r#"Here is the plan:
{"title":{"suggested":"Acme UltraMat Pro Yoga Mat","reason":"Adds the product type"},
 "tags":{"add":["non-slip"]},
 "quickWins":["Mention grip in the description"],
 "potentialScore":70}"#;

#[derive(Debug, Clone)]
enum Step {
    Reply(String),
    Fail,
}

/// Fake assistant replaying a script, then repeating its default step.
#[derive(Debug)]
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Step>>,
    default: Step,
    delay: Option<Duration>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    fn build(script: Vec<Step>, default: Step, delay: Option<Duration>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            default,
            delay,
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn always(reply: &str) -> Arc<Self> {
        Self::build(Vec::new(), Step::Reply(reply.to_string()), None)
    }

    pub fn failing() -> Arc<Self> {
        Self::build(Vec::new(), Step::Fail, None)
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Self::build(Vec::new(), Step::Reply(CITED_REPLY.to_string()), Some(delay))
    }

    /// Replies in order, then fails.
    pub fn sequence(replies: &[&str]) -> Arc<Self> {
        let script = replies.iter().map(|r| Step::Reply((*r).to_string())).collect();
        Self::build(script, Step::Fail, None)
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn send(&self, _system_prompt: &str, user_prompt: &str) -> Result<LlmReply, LlmError> {
        self.prompts.lock().unwrap().push(user_prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.default.clone());
        match step {
            Step::Reply(text) => Ok(LlmReply {
                text,
                usage: Some(TokenUsage {
                    prompt_tokens: 12,
                    completion_tokens: 40,
                    total_tokens: 52,
                }),
            }),
            Step::Fail => Err(LlmError::Api {
                status: 503,
                message: "upstream unavailable".to_string(),
            }),
        }
    }
}

pub fn settings() -> EngineSettings {
    EngineSettings {
        llm_timeout: Duration::from_millis(200),
        store_timeout: Duration::from_secs(1),
        low_credit_threshold: 2,
        citation_drop_threshold: 15.0,
        recommendation_platform: Platform::ChatGpt,
    }
}

pub fn providers(
    chatgpt: Option<Arc<ScriptedProvider>>,
    gemini: Option<Arc<ScriptedProvider>>,
) -> Providers {
    let mut providers = Providers::new();
    if let Some(p) = chatgpt {
        providers = providers.with(Platform::ChatGpt, p);
    }
    if let Some(p) = gemini {
        providers = providers.with(Platform::Gemini, p);
    }
    providers
}

pub fn engine(store: &Arc<MemoryStore>, providers: Providers) -> ScanEngine {
    ScanEngine::new(
        store.clone(),
        providers,
        CitationAnalyzer::default(),
        PricingTable::default(),
        settings(),
    )
    .with_question_seed(7)
}

pub fn yoga_mat() -> NewProduct {
    NewProduct {
        external_id: "gid://shopify/Product/1".to_string(),
        title: "Acme UltraMat Pro".to_string(),
        handle: Some("acme-ultramat-pro".to_string()),
        description: Some("Extra thick yoga mat.".to_string()),
        vendor: Some("Acme".to_string()),
        product_type: Some("Yoga Mat".to_string()),
        category: Some("Fitness".to_string()),
        price: None,
        tags: vec!["eco-friendly".to_string()],
    }
}

/// A shop holding `credits` with one yoga mat listed.
pub fn shop_with_product(store: &MemoryStore, credits: i32) -> (Shop, Product) {
    let shop = store.add_shop("acme.myshopify.com", Plan::Starter, credits);
    let product = store.add_product(shop.id, yoga_mat());
    (shop, product)
}

pub fn past_scan(product: &Product, platform: Platform, cited: bool) -> NewScan {
    NewScan {
        product_id: product.id,
        shop_id: product.shop_id,
        platform,
        question: "What are the best yoga mats?".to_string(),
        response: if cited { CITED_REPLY } else { UNCITED_REPLY }.to_string(),
        is_cited: cited,
        citation_excerpt: None,
        citation_position: None,
        sentiment: None,
        competitors: Vec::new(),
        missing_topics: Vec::new(),
        ignored_features: Vec::new(),
        confidence: 0.5,
        credits_used: 1,
        duration_ms: 100,
        prompt_tokens: None,
        completion_tokens: None,
        request_key: uuid::Uuid::new_v4(),
    }
}

/// Seeds `history` oldest first, one minute apart, ending an hour ago.
pub fn seed_history(store: &MemoryStore, product: &Product, history: &[(Platform, bool)]) {
    let start: DateTime<Utc> = Utc::now() - chrono::Duration::hours(2);
    for (i, (platform, cited)) in history.iter().enumerate() {
        let at = start + chrono::Duration::minutes(i64::try_from(i).unwrap());
        store.seed_scan(past_scan(product, *platform, *cited), at);
    }
}

pub fn approx(actual: f64, expected: f64) -> bool {
    (actual - expected).abs() < 0.05
}
