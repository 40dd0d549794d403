//! Session state for one interactive run: the conversation, the persisted
//! snippet store, and the latest search findings. One logical request at a
//! time drives it (one crawl or one completion call); the session owns the
//! store exclusively for its lifetime.

use quest_core::{
    build_prompt, CompletionBackend, CompletionRequest, Conversation, FetchBackend,
    HeuristicTokenCounter, Persona, PromptInput, Result, SearchProvider, SnippetStore,
};
use quest_local::{crawler, rank, store_fs::StoreFile};
use std::path::PathBuf;
use url::Url;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub persona: Persona,
    pub data_dir: PathBuf,
    pub max_total_tokens: usize,
    pub target_pages: usize,
    pub temperature: f64,
    /// Cap on finding texts entering the prompt block.
    pub max_prompt_findings: usize,
    /// Persist crawl batches from a detached task instead of inline.
    pub background_save: bool,
}

impl SessionConfig {
    pub fn new(persona: Persona, data_dir: PathBuf) -> Self {
        Self {
            persona,
            data_dir,
            max_total_tokens: 4000,
            target_pages: 3,
            temperature: 1.0,
            max_prompt_findings: 6,
            background_save: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchReport {
    pub query: String,
    pub pages_contributing: usize,
    pub new_records: usize,
    pub total_records: usize,
    pub findings: Vec<String>,
    pub sources: Vec<Url>,
}

pub struct Session {
    config: SessionConfig,
    conversation: Conversation,
    store: SnippetStore,
    store_file: StoreFile,
    latest_query: Option<String>,
    latest_findings: Vec<String>,
    latest_sources: Vec<Url>,
    search: Box<dyn SearchProvider>,
    fetcher: Box<dyn FetchBackend>,
    completion: Box<dyn CompletionBackend>,
    counter: HeuristicTokenCounter,
}

impl Session {
    /// Load the persisted store and seed the conversation; this is the
    /// `Uninitialized -> Initialized(persona)` transition.
    pub fn open(
        config: SessionConfig,
        search: Box<dyn SearchProvider>,
        fetcher: Box<dyn FetchBackend>,
        completion: Box<dyn CompletionBackend>,
    ) -> Self {
        let store_file = StoreFile::in_dir(&config.data_dir);
        let store = store_file.load();
        let conversation = Conversation::new(config.persona);
        Self {
            config,
            conversation,
            store,
            store_file,
            latest_query: None,
            latest_findings: Vec::new(),
            latest_sources: Vec::new(),
            search,
            fetcher,
            completion,
            counter: HeuristicTokenCounter,
        }
    }

    pub fn persona(&self) -> Persona {
        self.conversation.persona()
    }

    /// Switch persona, discarding the conversation. Returns false when the
    /// persona is unchanged (no reset happens). Findings survive; they
    /// belong to the store, not the conversation.
    pub fn set_persona(&mut self, persona: Persona) -> bool {
        if persona == self.conversation.persona() {
            return false;
        }
        self.conversation.reset(persona);
        true
    }

    pub fn store(&self) -> &SnippetStore {
        &self.store
    }

    pub fn latest_query(&self) -> Option<&str> {
        self.latest_query.as_deref()
    }

    pub fn latest_findings(&self) -> &[String] {
        &self.latest_findings
    }

    pub fn latest_sources(&self) -> &[Url] {
        &self.latest_sources
    }

    pub fn render_conversation(&self) -> Vec<String> {
        self.conversation.render()
    }

    /// Crawl, merge into the store, persist, and make the query's findings
    /// current. Duplicate queries surface as `Error::DuplicateQuery` with
    /// zero network traffic.
    pub async fn run_search(&mut self, query: &str) -> Result<SearchReport> {
        let outcome = crawler::crawl(
            self.search.as_ref(),
            self.fetcher.as_ref(),
            &self.store,
            query,
            self.config.target_pages,
        )
        .await?;

        let new_records = self.store.merge(outcome.records);
        if self.config.background_save {
            self.store_file.save_in_background(&self.store);
        } else {
            self.store_file.save(&self.store)?;
        }

        Ok(SearchReport {
            pages_contributing: outcome.pages_contributing,
            new_records,
            total_records: self.store.len(),
            findings: self.make_current(query),
            sources: self.latest_sources.clone(),
            query: query.to_string(),
        })
    }

    /// Point the prompt at a query already in the store, without crawling.
    /// Used after a duplicate-query notice.
    pub fn recall_query(&mut self, query: &str) -> Vec<String> {
        self.make_current(query)
    }

    fn make_current(&mut self, query: &str) -> Vec<String> {
        let records = self.store.findings_for(query);
        let texts: Vec<String> = records.iter().map(|r| r.text.clone()).collect();

        let mut sources: Vec<Url> = Vec::new();
        for record in &records {
            if !sources.contains(&record.link) {
                sources.push(record.link.clone());
            }
        }

        self.latest_findings = rank::top_findings(query, &texts, self.config.max_prompt_findings);
        self.latest_sources = sources;
        self.latest_query = Some(query.to_string());
        self.latest_findings.clone()
    }

    /// One chat exchange: assemble the prompt, run the completion inside the
    /// remaining token budget, and append both turns. The conversation is
    /// left untouched on any failure so the user can retry.
    pub async fn chat(&mut self, user_text: &str) -> Result<String> {
        let input = PromptInput {
            conversation: &self.conversation,
            findings: &self.latest_findings,
            query: self.latest_query.as_deref(),
            user_text,
            max_total_tokens: self.config.max_total_tokens,
        };
        let assembled = build_prompt(&input, &self.counter)?;

        let answer = self
            .completion
            .complete(&CompletionRequest {
                prompt: assembled.prompt,
                max_tokens: assembled.completion_budget,
                stop: Some(quest_core::prompt::STOP_SEQUENCE.to_string()),
                temperature: self.config.temperature,
            })
            .await?;

        self.conversation.append_user(user_text);
        self.conversation.append_assistant(answer.trim().to_string());
        Ok(answer)
    }
}
