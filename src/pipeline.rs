//! Strategy pipeline (C6): the central per-request state machine.
//!
//! Implemented as a linear `async fn` with early returns via `?` at each
//! step boundary rather than a hand-rolled state enum with a dispatch loop.
//! Every internal step returns `Result<_, EngineError>`; `EngineError::kind()`
//! already maps each variant onto the caller-facing `ErrorKind` for that
//! failure, so the only place that converts `Err` into a `ScrapeResult` is
//! the outermost [`Pipeline::run`].

use crate::cancellation::CancellationToken;
use crate::config::EngineConfig;
use crate::constants::{SNIPPET_DEFAULT_MAX_CHARS, SNIPPET_DEFAULT_MAX_SNIPPETS};
use crate::dom;
use crate::error::EngineError;
use crate::formatter;
use crate::options::{OutputMode, ScrapeOptions};
use crate::page_guard::PageGuard;
use crate::ports::browser::{BrowserPort, ChallengeKind, LoadPageOptions, WaitUntil};
use crate::ports::challenge::{ChallengePort, SolveRequest};
use crate::ports::model::{ModelPort, SuggestRequest};
use crate::ports::store::StorePort;
use crate::result::{OutputData, ScrapeResult};
use crate::scorer;
use crate::site_config::{normalize_domain, ExtractionMethod, SiteConfig};
use crate::utils::is_valid_url;
use crate::validator::{self, CandidateEvaluation};
use std::sync::Arc;

fn check_cancelled(token: &CancellationToken) -> Result<(), EngineError> {
    if token.is_cancelled() {
        Err(EngineError::Cancelled)
    } else {
        Ok(())
    }
}

/// A candidate that cleared the acceptance bar, ready to format and persist.
struct AcceptedCandidate {
    xpath: String,
    fragment_html: String,
}

/// Wires the four ports together for one request. Cheap to construct;
/// holds only `Arc`s, so `ScrapeEngine` builds one per call (or reuses a
/// single long-lived instance — both are equivalent since there is no
/// per-call mutable state here).
pub struct Pipeline<B, M, C, S> {
    browser: Arc<B>,
    model: Arc<M>,
    challenge: Arc<C>,
    store: Arc<S>,
    config: EngineConfig,
}

impl<B, M, C, S> Pipeline<B, M, C, S>
where
    B: BrowserPort,
    M: ModelPort,
    C: ChallengePort,
    S: StorePort,
{
    #[must_use]
    pub fn new(browser: Arc<B>, model: Arc<M>, challenge: Arc<C>, store: Arc<S>, config: EngineConfig) -> Self {
        Self { browser, model, challenge, store, config }
    }

    /// Runs one request to completion. Never panics on an
    /// operational failure: every error path is represented as a failed
    /// `ScrapeResult`.
    pub async fn run(&self, url: &str, options: &ScrapeOptions, token: &mut CancellationToken) -> ScrapeResult {
        match self.run_inner(url, options, token).await {
            Ok(result) => result,
            Err(err) => err.into(),
        }
    }

    async fn run_inner(
        &self,
        url: &str,
        options: &ScrapeOptions,
        token: &CancellationToken,
    ) -> Result<ScrapeResult, EngineError> {
        // VALIDATE_URL
        if !is_valid_url(url) {
            return Err(EngineError::Configuration(format!("not an absolute http(s) URL: {url}")));
        }

        // Known-rule override must fail fast on an unsafe selector, before
        // any page load: a selector override that fails the safety filter
        // is a configuration error, not a challenge/extraction one.
        if let Some(selector) = &options.selector_override {
            if !validator::is_safe_selector(selector) {
                return Err(EngineError::Configuration(format!(
                    "selector override fails the safety filter: {selector}"
                )));
            }
        }

        // LOOKUP_RULE before LOAD_PAGE: a stored rule's `headers` and
        // `user_agent_override` must reach the very first fetch, not just
        // inform which selector gets applied afterwards.
        let domain = normalize_domain(url);
        let stored = self.store.get(&domain).await.map_err(EngineError::from_port)?;
        let load_options = self.load_page_options(options, stored.as_ref());

        let page_id = self
            .browser
            .load_page(url, load_options)
            .await
            .map_err(|e| EngineError::Network(format!("{e:#}")))?;
        let guard = PageGuard::new(Arc::clone(&self.browser), page_id);
        check_cancelled(token)?;

        let challenge_solved = self.handle_challenge(&guard, url, options).await?;
        check_cancelled(token)?;

        // Raw-HTML fast path: loads and handles challenges, skips selector
        // validation entirely when the caller requests the full rendered
        // page instead of an extracted fragment.
        if matches!(options.output_mode, OutputMode::FullHtml) {
            let html = self
                .browser
                .get_page_html(guard.page())
                .await
                .map_err(|e| EngineError::Network(format!("{e:#}")));
            guard.close().await;
            let html = html?;
            return Ok(ScrapeResult {
                success: true,
                selector: None,
                method: Some(if challenge_solved {
                    ExtractionMethod::RenderPlusChallenge
                } else {
                    ExtractionMethod::DirectRender
                }),
                data: Some(OutputData::FullHtml { html }),
                error_kind: None,
                error: None,
                details: None,
            });
        }

        let cleanup_classes = stored.as_ref().and_then(|c| c.cleanup_classes.clone()).unwrap_or_default();

        let outcome = if let Some(selector) = &options.selector_override {
            self.apply_override(&guard, &domain, url, options, selector, &cleanup_classes, challenge_solved, token).await
        } else {
            match &stored {
                Some(cfg) if cfg.failures_since_success < self.config.rediscover_threshold => {
                    self.apply_known_rule(&guard, &domain, cfg.clone(), url, options, challenge_solved, token).await
                }
                _ => self.discover(&guard, &domain, url, options, stored, challenge_solved, token).await,
            }
        };

        guard.close().await;
        outcome
    }

    /// Per-call `options.user_agent` wins over a stored
    /// `user_agent_override` since it is the more specific, caller-supplied
    /// value; `headers` has no per-call equivalent (see
    /// `ScrapeOptions`/spec §6.1) so it always comes from the stored rule.
    fn load_page_options(&self, options: &ScrapeOptions, stored: Option<&SiteConfig>) -> LoadPageOptions {
        let timeout = options
            .timeout_ms
            .map(std::time::Duration::from_millis)
            .or(Some(self.config.default_timeout));
        let user_agent = options
            .user_agent
            .clone()
            .or_else(|| stored.and_then(|cfg| cfg.user_agent_override.clone()));
        LoadPageOptions {
            proxy: options.proxy.as_ref().map(|p| p.server.clone()),
            user_agent,
            timeout,
            wait_until: Some(WaitUntil::Load),
            headers: stored.and_then(|cfg| cfg.headers.clone()),
        }
    }

    /// Runs DETECT_CHALLENGE → (SOLVE_CHALLENGE on a present challenge).
    /// Returns whether a challenge was encountered and solved (used to tag
    /// the persisted `ExtractionMethod`).
    async fn handle_challenge(
        &self,
        guard: &PageGuard<B>,
        url: &str,
        options: &ScrapeOptions,
    ) -> Result<bool, EngineError> {
        let detected = self
            .browser
            .detect_challenge(guard.page())
            .await
            .map_err(|e| EngineError::Network(format!("{e:#}")))?;

        if matches!(detected.kind, ChallengeKind::None) {
            return Ok(false);
        }

        // Open question 3: generic CAPTCHA with no extracted site key is a
        // CHALLENGE failure, never a silent success.
        if matches!(detected.kind, ChallengeKind::Generic) && detected.site_key.is_none() {
            return Err(EngineError::Challenge(
                "generic challenge detected with no site key extracted".to_string(),
            ));
        }

        let outcome = self
            .challenge
            .solve(SolveRequest {
                page: guard.page().clone(),
                kind: detected.kind,
                page_url: url.to_string(),
                captcha_url: detected.captcha_url,
                site_key: detected.site_key,
                proxy: options.proxy.as_ref().map(|p| p.server.clone()),
                user_agent: options.user_agent.clone(),
            })
                .await
                .map_err(|e| EngineError::Challenge(format!("{e:#}")))?;

        if !outcome.solved {
            return Err(EngineError::Challenge(
                outcome.reason.unwrap_or_else(|| "challenge solver reported failure".to_string()),
            ));
        }

        if let Some(cookie) = outcome.updated_cookie {
            self.browser
                .set_cookies(guard.page(), &cookie)
                .await
                .map_err(|e| EngineError::Challenge(format!("{e:#}")))?;
            self.browser
                .reload(guard.page(), Some(self.config.default_timeout))
                .await
                .map_err(|e| EngineError::Challenge(format!("{e:#}")))?;
        }

        Ok(true)
    }

    async fn apply_override(
        &self,
        guard: &PageGuard<B>,
        domain: &str,
        url: &str,
        options: &ScrapeOptions,
        selector: &str,
        cleanup_classes: &[String],
        challenge_solved: bool,
        token: &CancellationToken,
    ) -> Result<ScrapeResult, EngineError> {
        check_cancelled(token)?;
        let eval = validator::evaluate(&*self.browser, guard.page(), selector).await?;
        if validator::meets_acceptance_bar(
            eval.details.as_ref(),
            self.config.min_content_chars,
            self.config.min_score_threshold,
        ) {
            self.store.mark_success(domain).await.map_err(EngineError::from_port)?;
            let fragment_html = eval.fragment_html.expect("accepted candidate always has a fragment");
            let method = if challenge_solved { ExtractionMethod::RenderPlusChallenge } else { ExtractionMethod::DirectRender };
            return Ok(self.format_success(guard, selector, &fragment_html, options, method, cleanup_classes));
        }

        // "on reject, fall through to a single discovery attempt".
        let stored = self.store.get(domain).await.map_err(EngineError::from_port)?;
        self.discover(guard, domain, url, options, stored, challenge_solved, token).await
    }

    async fn apply_known_rule(
        &self,
        guard: &PageGuard<B>,
        domain: &str,
        cfg: SiteConfig,
        url: &str,
        options: &ScrapeOptions,
        challenge_solved: bool,
        token: &CancellationToken,
    ) -> Result<ScrapeResult, EngineError> {
        check_cancelled(token)?;
        let eval = validator::evaluate(&*self.browser, guard.page(), &cfg.selector).await?;
        if validator::meets_acceptance_bar(
            eval.details.as_ref(),
            self.config.min_content_chars,
            self.config.min_score_threshold,
        ) {
            self.store.mark_success(domain).await.map_err(EngineError::from_port)?;
            let fragment_html = eval.fragment_html.expect("accepted candidate always has a fragment");
            let cleanup_classes = cfg.cleanup_classes.clone().unwrap_or_default();
            return Ok(self.format_success(guard, &cfg.selector, &fragment_html, options, cfg.method, &cleanup_classes));
        }

        self.store.increment_failure(domain).await.map_err(EngineError::from_port)?;
        let new_failure_count = cfg.failures_since_success + 1;
        if new_failure_count >= self.config.rediscover_threshold {
            self.discover(guard, domain, url, options, Some(cfg.clone()), challenge_solved, token).await
        } else {
            Err(EngineError::Extraction(format!(
                "known rule '{}' no longer matches acceptable content ({new_failure_count}/{} failures)",
                cfg.selector, self.config.rediscover_threshold
            )))
        }
    }

    async fn discover(
        &self,
        guard: &PageGuard<B>,
        domain: &str,
        url: &str,
        options: &ScrapeOptions,
        previous: Option<SiteConfig>,
        challenge_solved: bool,
        token: &CancellationToken,
    ) -> Result<ScrapeResult, EngineError> {
        check_cancelled(token)?;
        let html = self
            .browser
            .get_page_html(guard.page())
            .await
            .map_err(|e| EngineError::Network(format!("{e:#}")))?;

        let simplified_dom = dom::simplify(&html);
        let snippet_list = dom::snippets(&html, SNIPPET_DEFAULT_MAX_SNIPPETS, SNIPPET_DEFAULT_MAX_CHARS);

        check_cancelled(token)?;
        let reply = self
            .model
            .suggest(SuggestRequest {
                simplified_dom,
                snippets: snippet_list,
                url: url.to_string(),
                previous_failure_reason: None,
            })
                .await
                .map_err(|e| EngineError::Model(format!("{e:#}")))?;

        let candidates = crate::xpath_parser::parse_candidates(&reply);
        if candidates.is_empty() {
            return Err(EngineError::Model("model returned no usable candidates".to_string()));
        }

        let mut evaluations: Vec<CandidateEvaluation> = Vec::with_capacity(candidates.len());
        for xpath in &candidates {
            check_cancelled(token)?;
            evaluations.push(validator::evaluate(&*self.browser, guard.page(), xpath).await?);
        }

        // Stable "first candidate wins ties" selection, matching
        // `scorer::rank`'s stable sort: ties are broken by candidate order.
        let mut best: Option<(CandidateEvaluation, f32)> = None;
        for eval in evaluations {
            let score = eval.details.as_ref().map_or(0.0, scorer::score);
            match &best {
                Some((_, best_score)) if *best_score >= score => {}
                _ => best = Some((eval, score)),
            }
        }

        let Some((accepted_eval, _)) = best.filter(|(eval, _)| {
            validator::meets_acceptance_bar(
                eval.details.as_ref(),
                self.config.min_content_chars,
                self.config.min_score_threshold,
            )
        }) else {
            return Err(EngineError::Extraction(
                "no discovered candidate passed the acceptance bar".to_string(),
            ));
        };

        let accepted = AcceptedCandidate {
            xpath: accepted_eval.xpath,
            fragment_html: accepted_eval.fragment_html.expect("accepted candidate always has a fragment"),
        };

        let method = if challenge_solved { ExtractionMethod::RenderPlusChallenge } else { ExtractionMethod::DirectRender };
        let mut new_cfg = SiteConfig::new_discovered(domain.to_string(), accepted.xpath.clone(), method);
        // Preserve operator-set fields across rediscovery; a fresh
        // `new_discovered()` resets them, which would silently drop a
        // human's header/user-agent/cleanup-class edits.
        let cleanup_classes = previous.as_ref().and_then(|p| p.cleanup_classes.clone()).unwrap_or_default();
        if let Some(previous) = previous {
            new_cfg.headers = previous.headers;
            new_cfg.user_agent_override = previous.user_agent_override;
            new_cfg.cleanup_classes = previous.cleanup_classes;
        }
        if challenge_solved {
            new_cfg.needs_challenge_solver = Some(true);
        }

        self.store.save(new_cfg).await.map_err(EngineError::from_port)?;

        Ok(self.format_success(guard, &accepted.xpath, &accepted.fragment_html, options, method, &cleanup_classes))
    }

    fn format_success(
        &self,
        guard: &PageGuard<B>,
        selector: &str,
        fragment_html: &str,
        options: &ScrapeOptions,
        method: ExtractionMethod,
        cleanup_classes: &[String],
    ) -> ScrapeResult {
        let _ = guard;
        let full_html_placeholder = String::new();
        let data = formatter::format(
            options.output_mode,
            selector,
            fragment_html,
            &full_html_placeholder,
            method,
            cleanup_classes,
        );
        ScrapeResult::success(selector.to_string(), method, data)
    }
}
