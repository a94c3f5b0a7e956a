use serde::{Deserialize, Serialize};
use std::fmt;

use crate::extractors::{CaptionSource, MetadataResolver, VideoInfo};
use crate::output::Presenter;
use crate::prompt::{BuiltPrompt, PromptBuilder, SummaryMode};
use crate::summarize::Summarizer;
use crate::transcript::{
    check_caption_block, filter_captions, render_caption_block, CaptionSegment, FilteredTranscript,
};
use crate::utils::{format_duration, truncate_chars};
use crate::SummaryError;

/// Token budget used when the caller does not supply one
pub const DEFAULT_MAX_TOKENS: u32 = 4069;

/// Stages of a summary run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PipelineState {
    Start,
    MetadataFetched,
    CaptionsFetched,
    Filtered,
    PromptBuilt,
    SummaryFetched,
    Done,
    Aborted,
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Aborted)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Start => "start",
            PipelineState::MetadataFetched => "metadata-fetched",
            PipelineState::CaptionsFetched => "captions-fetched",
            PipelineState::Filtered => "filtered",
            PipelineState::PromptBuilt => "prompt-built",
            PipelineState::SummaryFetched => "summary-fetched",
            PipelineState::Done => "done",
            PipelineState::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Caller inputs for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryOptions {
    /// Video URL or id
    pub reference: String,

    /// Caption language code
    pub language: String,

    /// Mode name; unknown names fall back to `standart`
    pub mode: String,

    /// Token budget override
    pub max_tokens: Option<u32>,

    /// Ask the presenter to copy the summary
    pub copy_to_clipboard: bool,
}

impl SummaryOptions {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            language: "en".to_string(),
            mode: SummaryMode::Standard.to_string(),
            max_tokens: None,
            copy_to_clipboard: false,
        }
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = mode.into();
        self
    }

    pub fn max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn copy_to_clipboard(mut self, copy: bool) -> Self {
        self.copy_to_clipboard = copy;
        self
    }
}

/// Summary produced by a successful run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryResult {
    /// Generated summary text
    pub text: String,

    /// Mode the prompt was built with
    pub mode: SummaryMode,

    /// Video the summary belongs to
    pub video: VideoInfo,
}

/// Per-run state threaded from stage to stage
struct RunContext<'o> {
    options: &'o SummaryOptions,
    state: PipelineState,
}

impl<'o> RunContext<'o> {
    fn new(options: &'o SummaryOptions) -> Self {
        Self {
            options,
            state: PipelineState::Start,
        }
    }

    fn advance(&mut self, next: PipelineState, presenter: &dyn Presenter, detail: &str) {
        debug_assert!(!self.state.is_terminal(), "run already finished");
        tracing::debug!("pipeline {} -> {}", self.state, next);
        self.state = next;
        presenter.stage(next, detail);
    }
}

/// Short label for progress output
fn describe_video(video: &VideoInfo) -> String {
    let title = truncate_chars(&video.title, 80);
    match video.duration {
        Some(seconds) => format!("{} ({})", title, format_duration(seconds)),
        None => title,
    }
}

/// Single-video summary pipeline
pub struct SummaryPipeline {
    resolver: Box<dyn MetadataResolver>,
    captions: Box<dyn CaptionSource>,
    summarizer: Box<dyn Summarizer>,
    presenter: Box<dyn Presenter>,
    prompt_builder: PromptBuilder,
}

impl SummaryPipeline {
    pub fn new(
        resolver: Box<dyn MetadataResolver>,
        captions: Box<dyn CaptionSource>,
        summarizer: Box<dyn Summarizer>,
        presenter: Box<dyn Presenter>,
    ) -> Self {
        Self {
            resolver,
            captions,
            summarizer,
            presenter,
            prompt_builder: PromptBuilder::new(),
        }
    }

    /// Run every stage in order, stopping at the first collaborator failure
    pub async fn run(&self, options: &SummaryOptions) -> Result<SummaryResult, SummaryError> {
        let mut run = RunContext::new(options);
        self.presenter.stage(
            PipelineState::Start,
            &format!(
                "Processing video: {}, Language: {}, Mode: {}",
                options.reference, options.language, options.mode
            ),
        );

        match self.execute(&mut run).await {
            Ok(result) => {
                self.presenter.present(&result, options.copy_to_clipboard);
                run.advance(PipelineState::Done, self.presenter.as_ref(), "");
                Ok(result)
            }
            Err(e) => {
                tracing::debug!("Pipeline aborted after {}: {}", run.state, e);
                run.advance(PipelineState::Aborted, self.presenter.as_ref(), &e.to_string());
                Err(e)
            }
        }
    }

    async fn execute(&self, run: &mut RunContext<'_>) -> Result<SummaryResult, SummaryError> {
        let options = run.options;
        let presenter = self.presenter.as_ref();

        let video = self
            .resolver
            .resolve(&options.reference)
            .await
            .map_err(|e| SummaryError::Retrieval(format!("{:#}", e)))?;
        run.advance(PipelineState::MetadataFetched, presenter, &describe_video(&video));

        let segments = self.fetch_captions(&video, &options.language).await?;
        run.advance(
            PipelineState::CaptionsFetched,
            presenter,
            &format!("{} caption segments", segments.len()),
        );

        let transcript = self.filter(&segments);
        run.advance(
            PipelineState::Filtered,
            presenter,
            &format!("{} words", transcript.word_count()),
        );

        let prompt = self.build_prompt(&video, &transcript, &options.mode);
        run.advance(PipelineState::PromptBuilt, presenter, prompt.mode.as_str());

        let max_tokens = options.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS);
        let text = self
            .summarizer
            .complete(&prompt.text, max_tokens)
            .await
            .map_err(|e| SummaryError::Completion(format!("{:#}", e)))?;
        if text.trim().is_empty() {
            return Err(SummaryError::Completion("empty response".to_string()));
        }
        run.advance(PipelineState::SummaryFetched, presenter, "");

        Ok(SummaryResult {
            text,
            mode: prompt.mode,
            video,
        })
    }

    async fn fetch_captions(&self, video: &VideoInfo, language: &str) -> Result<Vec<CaptionSegment>, SummaryError> {
        let segments = self
            .captions
            .fetch_captions(&video.id, language)
            .await
            .map_err(|e| SummaryError::CaptionUnavailable(format!("{:#}", e)))?;

        if segments.is_empty() {
            return Err(SummaryError::CaptionUnavailable(format!(
                "no '{}' captions for {}",
                language, video.id
            )));
        }

        Ok(segments)
    }

    fn filter(&self, segments: &[CaptionSegment]) -> FilteredTranscript {
        let block = render_caption_block(segments);
        if let Err(e) = check_caption_block(&block) {
            tracing::warn!("Caption block is malformed, filtering anyway: {}", e);
        }
        filter_captions(&block)
    }

    fn build_prompt(&self, video: &VideoInfo, transcript: &FilteredTranscript, mode: &str) -> BuiltPrompt {
        let prompt = self.prompt_builder.build(&video.title, transcript, mode);
        if let Some(fallback) = &prompt.fallback {
            self.presenter.warn(&fallback.to_string());
        }
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::{MockCaptionSource, MockMetadataResolver};
    use crate::output::MockPresenter;
    use crate::prompt::{build_prompt, SummaryRequest};
    use crate::summarize::MockSummarizer;
    use std::sync::{Arc, Mutex};

    fn demo_video() -> VideoInfo {
        VideoInfo {
            id: "abc123".to_string(),
            title: "Demo".to_string(),
            duration: Some(5.0),
            uploader: None,
            original_url: "https://www.youtube.com/watch?v=abc123".to_string(),
        }
    }

    fn demo_segments() -> Vec<CaptionSegment> {
        vec![
            CaptionSegment::new(0.0, 2.0, "Hi there"),
            CaptionSegment::new(2.0, 3.0, "General Kenobi"),
        ]
    }

    fn expected_prompt(mode: SummaryMode) -> String {
        let transcript = FilteredTranscript::from("Hi there General Kenobi".to_string());
        build_prompt(&SummaryRequest::new("Demo", transcript, mode))
    }

    fn resolving_demo() -> MockMetadataResolver {
        let mut resolver = MockMetadataResolver::new();
        resolver
            .expect_resolve()
            .times(1)
            .returning(|_| Ok(demo_video()));
        resolver
    }

    fn captions_for_demo() -> MockCaptionSource {
        let mut captions = MockCaptionSource::new();
        captions
            .expect_fetch_captions()
            .withf(|id, lang| id == "abc123" && lang == "en")
            .times(1)
            .returning(|_, _| Ok(demo_segments()));
        captions
    }

    fn quiet_presenter() -> MockPresenter {
        let mut presenter = MockPresenter::new();
        presenter.expect_stage().returning(|_, _| ());
        presenter.expect_warn().times(0);
        presenter
    }

    #[tokio::test]
    async fn test_standard_end_to_end() {
        let expected = expected_prompt(SummaryMode::Standard);
        assert!(expected.contains("Demo"));
        assert!(expected.contains("Hi there General Kenobi"));

        let mut summarizer = MockSummarizer::new();
        summarizer
            .expect_complete()
            .withf(move |prompt, max_tokens| prompt.to_string() == expected && *max_tokens == DEFAULT_MAX_TOKENS)
            .times(1)
            .returning(|_, _| Ok("A greeting exchange occurs.".to_string()));

        let mut presenter = quiet_presenter();
        presenter
            .expect_present()
            .withf(|result, copy| result.text == "A greeting exchange occurs." && !*copy)
            .times(1)
            .returning(|_, _| ());

        let pipeline = SummaryPipeline::new(
            Box::new(resolving_demo()),
            Box::new(captions_for_demo()),
            Box::new(summarizer),
            Box::new(presenter),
        );

        let result = pipeline
            .run(&SummaryOptions::new("https://www.youtube.com/watch?v=abc123"))
            .await
            .unwrap();

        assert_eq!(result.text, "A greeting exchange occurs.");
        assert_eq!(result.mode, SummaryMode::Standard);
        assert_eq!(result.video.title, "Demo");
    }

    #[tokio::test]
    async fn test_bulletpoint_end_to_end() {
        let expected = expected_prompt(SummaryMode::Bulletpoint);
        assert_ne!(expected, expected_prompt(SummaryMode::Standard));
        assert!(expected.contains("markdown"));

        let mut summarizer = MockSummarizer::new();
        summarizer
            .expect_complete()
            .withf(move |prompt, _| prompt.to_string() == expected)
            .times(1)
            .returning(|_, _| Ok("- A greeting exchange occurs.".to_string()));

        let mut presenter = quiet_presenter();
        presenter
            .expect_present()
            .withf(|result, copy| result.mode == SummaryMode::Bulletpoint && *copy)
            .times(1)
            .returning(|_, _| ());

        let pipeline = SummaryPipeline::new(
            Box::new(resolving_demo()),
            Box::new(captions_for_demo()),
            Box::new(summarizer),
            Box::new(presenter),
        );

        let options = SummaryOptions::new("abc123")
            .mode("bulletpoint")
            .copy_to_clipboard(true);
        let result = pipeline.run(&options).await.unwrap();

        assert_eq!(result.text, "- A greeting exchange occurs.");
        assert_eq!(result.mode, SummaryMode::Bulletpoint);
    }

    #[tokio::test]
    async fn test_metadata_failure_short_circuits() {
        let mut resolver = MockMetadataResolver::new();
        resolver
            .expect_resolve()
            .times(1)
            .returning(|_| Err(anyhow::anyhow!("yt-dlp returned 1: video unavailable")));

        let mut captions = MockCaptionSource::new();
        captions.expect_fetch_captions().times(0);

        let mut summarizer = MockSummarizer::new();
        summarizer.expect_complete().times(0);

        // The prompt builder is a plain value rather than a collaborator, so its
        // absence shows in the stage trail: nothing past Start is announced.
        let mut presenter = MockPresenter::new();
        presenter
            .expect_stage()
            .withf(|state, _| matches!(state, PipelineState::Start | PipelineState::Aborted))
            .times(2)
            .returning(|_, _| ());
        presenter.expect_warn().times(0);
        presenter.expect_present().times(0);

        let pipeline = SummaryPipeline::new(
            Box::new(resolver),
            Box::new(captions),
            Box::new(summarizer),
            Box::new(presenter),
        );

        let err = pipeline.run(&SummaryOptions::new("abc123")).await.unwrap_err();
        assert!(matches!(err, SummaryError::Retrieval(ref msg) if msg.contains("video unavailable")));
        assert_eq!(err.stage(), PipelineState::Start);
    }

    #[tokio::test]
    async fn test_caption_failure_skips_summarizer() {
        let mut captions = MockCaptionSource::new();
        captions
            .expect_fetch_captions()
            .times(1)
            .returning(|_, _| Err(anyhow::anyhow!("No transcripts were found")));

        let mut summarizer = MockSummarizer::new();
        summarizer.expect_complete().times(0);

        let mut presenter = quiet_presenter();
        presenter.expect_present().times(0);

        let pipeline = SummaryPipeline::new(
            Box::new(resolving_demo()),
            Box::new(captions),
            Box::new(summarizer),
            Box::new(presenter),
        );

        let err = pipeline.run(&SummaryOptions::new("abc123")).await.unwrap_err();
        assert!(matches!(err, SummaryError::CaptionUnavailable(_)));
    }

    #[tokio::test]
    async fn test_empty_captions_are_unavailable() {
        let mut captions = MockCaptionSource::new();
        captions
            .expect_fetch_captions()
            .times(1)
            .returning(|_, _| Ok(Vec::new()));

        let mut summarizer = MockSummarizer::new();
        summarizer.expect_complete().times(0);

        let mut presenter = quiet_presenter();
        presenter.expect_present().times(0);

        let pipeline = SummaryPipeline::new(
            Box::new(resolving_demo()),
            Box::new(captions),
            Box::new(summarizer),
            Box::new(presenter),
        );

        let err = pipeline
            .run(&SummaryOptions::new("abc123").language("de"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            SummaryError::CaptionUnavailable("no 'de' captions for abc123".to_string())
        );
    }

    #[tokio::test]
    async fn test_completion_failure_aborts() {
        let mut summarizer = MockSummarizer::new();
        summarizer
            .expect_complete()
            .times(1)
            .returning(|_, _| Err(anyhow::anyhow!("HTTP 429 Too Many Requests: quota exceeded")));

        let mut presenter = MockPresenter::new();
        presenter
            .expect_stage()
            .withf(|state, _| *state != PipelineState::Done)
            .returning(|_, _| ());
        presenter.expect_warn().times(0);
        presenter.expect_present().times(0);

        let pipeline = SummaryPipeline::new(
            Box::new(resolving_demo()),
            Box::new(captions_for_demo()),
            Box::new(summarizer),
            Box::new(presenter),
        );

        let err = pipeline.run(&SummaryOptions::new("abc123")).await.unwrap_err();
        assert!(matches!(err, SummaryError::Completion(ref msg) if msg.contains("quota exceeded")));
        assert_eq!(err.stage(), PipelineState::PromptBuilt);
    }

    #[tokio::test]
    async fn test_blank_completion_is_an_error() {
        let mut summarizer = MockSummarizer::new();
        summarizer
            .expect_complete()
            .times(1)
            .returning(|_, _| Ok("   ".to_string()));

        let mut presenter = quiet_presenter();
        presenter.expect_present().times(0);

        let pipeline = SummaryPipeline::new(
            Box::new(resolving_demo()),
            Box::new(captions_for_demo()),
            Box::new(summarizer),
            Box::new(presenter),
        );

        let err = pipeline.run(&SummaryOptions::new("abc123")).await.unwrap_err();
        assert!(matches!(err, SummaryError::Completion(_)));
    }

    #[tokio::test]
    async fn test_unknown_mode_warns_and_uses_standard() {
        let expected = expected_prompt(SummaryMode::Standard);

        let mut summarizer = MockSummarizer::new();
        summarizer
            .expect_complete()
            .withf(move |prompt, _| prompt.to_string() == expected)
            .times(1)
            .returning(|_, _| Ok("Summary text".to_string()));

        let mut presenter = MockPresenter::new();
        presenter.expect_stage().returning(|_, _| ());
        presenter
            .expect_warn()
            .withf(|message| message.contains("haiku"))
            .times(1)
            .returning(|_| ());
        presenter.expect_present().times(1).returning(|_, _| ());

        let pipeline = SummaryPipeline::new(
            Box::new(resolving_demo()),
            Box::new(captions_for_demo()),
            Box::new(summarizer),
            Box::new(presenter),
        );

        let result = pipeline
            .run(&SummaryOptions::new("abc123").mode("haiku"))
            .await
            .unwrap();
        assert_eq!(result.mode, SummaryMode::Standard);
    }

    #[tokio::test]
    async fn test_token_budget_override() {
        let mut summarizer = MockSummarizer::new();
        summarizer
            .expect_complete()
            .withf(|_, max_tokens| *max_tokens == 512)
            .times(1)
            .returning(|_, _| Ok("Short.".to_string()));

        let mut presenter = quiet_presenter();
        presenter.expect_present().times(1).returning(|_, _| ());

        let pipeline = SummaryPipeline::new(
            Box::new(resolving_demo()),
            Box::new(captions_for_demo()),
            Box::new(summarizer),
            Box::new(presenter),
        );

        let result = pipeline
            .run(&SummaryOptions::new("abc123").max_tokens(Some(512)))
            .await
            .unwrap();
        assert_eq!(result.text, "Short.");
    }

    #[tokio::test]
    async fn test_result_is_presented_before_done() {
        let events = Arc::new(Mutex::new(Vec::new()));

        let mut summarizer = MockSummarizer::new();
        summarizer
            .expect_complete()
            .times(1)
            .returning(|_, _| Ok("A greeting exchange occurs.".to_string()));

        let mut presenter = MockPresenter::new();
        let stages = Arc::clone(&events);
        presenter
            .expect_stage()
            .returning(move |state, _| stages.lock().unwrap().push(state.to_string()));
        let presented = Arc::clone(&events);
        presenter
            .expect_present()
            .times(1)
            .returning(move |_, _| presented.lock().unwrap().push("present".to_string()));
        presenter.expect_warn().times(0);

        let pipeline = SummaryPipeline::new(
            Box::new(resolving_demo()),
            Box::new(captions_for_demo()),
            Box::new(summarizer),
            Box::new(presenter),
        );
        pipeline.run(&SummaryOptions::new("abc123")).await.unwrap();

        let events = events.lock().unwrap();
        assert_eq!(events[events.len() - 3..], ["summary-fetched", "present", "done"]);
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    /// Collect everything logged at `warn` or above on this thread
    fn capture_warnings() -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        (logs, tracing::subscriber::set_default(subscriber))
    }

    #[tokio::test]
    async fn test_presenter_is_the_only_diagnostic_channel() {
        let (logs, _guard) = capture_warnings();

        let mut summarizer = MockSummarizer::new();
        summarizer
            .expect_complete()
            .times(1)
            .returning(|_, _| Err(anyhow::anyhow!("HTTP 500: upstream failure")));

        let mut presenter = MockPresenter::new();
        presenter.expect_stage().returning(|_, _| ());
        presenter.expect_warn().times(1).returning(|_| ());
        presenter.expect_present().times(0);

        let pipeline = SummaryPipeline::new(
            Box::new(resolving_demo()),
            Box::new(captions_for_demo()),
            Box::new(summarizer),
            Box::new(presenter),
        );

        let err = pipeline
            .run(&SummaryOptions::new("abc123").mode("haiku"))
            .await
            .unwrap_err();
        assert!(matches!(err, SummaryError::Completion(_)));
        assert_eq!(logs.contents(), "");
    }

    #[test]
    fn test_describe_video() {
        assert_eq!(describe_video(&demo_video()), "Demo (5s)");
    }

    #[test]
    fn test_terminal_states() {
        assert!(PipelineState::Done.is_terminal());
        assert!(PipelineState::Aborted.is_terminal());
        assert!(!PipelineState::PromptBuilt.is_terminal());
        assert_eq!(PipelineState::CaptionsFetched.to_string(), "captions-fetched");
    }
}
