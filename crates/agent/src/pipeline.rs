//! The lesson pipeline: runs the step graph for one thread.
//!
//! [`LessonPipeline::invoke`] is the single entry point. It validates the
//! request, restores what the thread remembers, walks the graph from Memory
//! to Quiz Master, and writes a checkpoint after every step.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use chrono::Utc;
use eduguardian_config::{AppConfig, LocalFact};
use eduguardian_core::{
    Checkpoint, Checkpointer, Error, EventBus, LessonRequest, LessonState, LessonTurn,
    PipelineEvent, Provider, SearchProvider, StepName, ThreadId,
};
use tracing::{debug, info, warn};
use uuid::Uuid;
use crate::graph::{self, RetryPolicy, RouteSnapshot, STEP_LIMIT};
use crate::steps::{
    Generator, JudgeStep, MemoryStep, QuizMasterStep, SentinelStep, Step, TutorStep, WebSearchStep,
};

/// Tunables for a pipeline, usually derived from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub policy: RetryPolicy,
    pub fallback_score: f64,
    pub step_timeout: Duration,
    pub degrade_on_search_failure: bool,
    pub search_max_results: usize,
    pub search_include_images: bool,
    pub default_student_profile: String,
    pub local_knowledge: Vec<LocalFact>,
    /// Finished lessons kept in a thread's checkpoint
    pub max_turns: usize,
}

impl PipelineSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        let model = config
            .providers
            .get(&config.default_provider)
            .and_then(|p| p.default_model.clone())
            .unwrap_or_else(|| config.default_model.clone());

        Self {
            model,
            temperature: config.default_temperature,
            max_tokens: config.default_max_tokens,
            policy: RetryPolicy {
                threshold: config.pipeline.faithfulness_threshold,
                max_tutor_iterations: config.pipeline.max_tutor_iterations,
            },
            fallback_score: config.pipeline.fallback_score,
            step_timeout: Duration::from_secs(config.pipeline.step_timeout_secs),
            degrade_on_search_failure: config.pipeline.degrade_on_search_failure,
            search_max_results: config.search.max_results,
            search_include_images: config.search.include_images,
            default_student_profile: config.pipeline.default_student_profile.clone(),
            local_knowledge: config.pipeline.local_knowledge.clone(),
            max_turns: config.checkpoint.max_turns,
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// A run that stopped before reaching the end of the graph.
#[derive(Debug)]
pub struct RunFailure {
    /// The step that failed; `None` when the run was rejected before any step
    pub step: Option<StepName>,
    /// State as of the last merged update
    pub state: Box<LessonState>,
    pub source: Error,
}

impl RunFailure {
    fn before_start(state: LessonState, source: Error) -> Self {
        Self {
            step: None,
            state: Box::new(state),
            source,
        }
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self.source, Error::InvalidInput(_))
    }
}

impl fmt::Display for RunFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.step {
            Some(step) => write!(f, "lesson run failed at {step}: {}", self.source),
            None => write!(f, "lesson run rejected: {}", self.source),
        }
    }
}

impl std::error::Error for RunFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Drives the six steps over one thread's state.
pub struct LessonPipeline {
    memory: MemoryStep,
    sentinel: SentinelStep,
    web_search: WebSearchStep,
    tutor: TutorStep,
    judge: JudgeStep,
    quiz_master: QuizMasterStep,
    policy: RetryPolicy,
    max_turns: usize,
    checkpointer: Arc<dyn Checkpointer>,
    event_bus: Arc<EventBus>,
}

impl LessonPipeline {
    pub fn new(
        provider: Arc<dyn Provider>,
        search: Arc<dyn SearchProvider>,
        checkpointer: Arc<dyn Checkpointer>,
        settings: PipelineSettings,
    ) -> Self {
        let generator = Generator::new(provider, &settings.model)
            .with_temperature(settings.temperature)
            .with_max_tokens(settings.max_tokens)
            .with_timeout(settings.step_timeout);

        Self {
            memory: MemoryStep::new(settings.default_student_profile),
            sentinel: SentinelStep::new(settings.local_knowledge),
            web_search: WebSearchStep::new(search)
                .with_limits(settings.search_max_results, settings.search_include_images)
                .with_timeout(settings.step_timeout)
                .with_degrade_on_failure(settings.degrade_on_search_failure),
            tutor: TutorStep::new(generator.clone()),
            judge: JudgeStep::new(generator.clone(), settings.policy, settings.fallback_score),
            quiz_master: QuizMasterStep::new(generator),
            policy: settings.policy,
            max_turns: settings.max_turns,
            checkpointer,
            event_bus: Arc::new(EventBus::default()),
        }
    }

    /// Publish progress on a shared bus instead of a private one.
    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = event_bus;
        self
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    pub fn checkpointer(&self) -> &Arc<dyn Checkpointer> {
        &self.checkpointer
    }

    fn step(&self, name: StepName) -> &dyn Step {
        match name {
            StepName::Memory => &self.memory,
            StepName::Sentinel => &self.sentinel,
            StepName::WebSearch => &self.web_search,
            StepName::Tutor => &self.tutor,
            StepName::Judge => &self.judge,
            StepName::QuizMaster => &self.quiz_master,
        }
    }

    /// Run one lesson on `thread_id` and return the final state.
    pub async fn invoke(
        &self,
        thread_id: &ThreadId,
        request: LessonRequest,
    ) -> Result<LessonState, RunFailure> {
        let mut state = LessonState::from_request(&request);

        if let Err(e) = request.validate() {
            return Err(RunFailure::before_start(state, e));
        }

        let previous = match self.checkpointer.get(thread_id).await {
            Ok(previous) => previous,
            Err(e) => return Err(RunFailure::before_start(state, e.into())),
        };

        if state.student_profile.is_empty() {
            if let Some(cp) = &previous {
                state.student_profile = cp.state.student_profile.clone();
            }
        }
        let mut turns = previous.map(|cp| cp.turns).unwrap_or_default();

        let run_id = Uuid::new_v4().to_string();
        info!(thread_id = %thread_id, run_id = %run_id, level = %state.student_level, "Lesson run started");
        self.event_bus.publish(PipelineEvent::RunStarted {
            thread_id: thread_id.to_string(),
            run_id: run_id.clone(),
            timestamp: Utc::now(),
        });

        let mut current = StepName::Memory;
        let mut last_completed = None;
        let mut executed = 0;

        loop {
            executed += 1;
            if executed > STEP_LIMIT {
                let e = Error::Internal(format!("step limit of {STEP_LIMIT} exceeded"));
                let run = RunContext { thread_id, run_id: &run_id, last_completed, turns: &turns };
                return Err(self.fail(run, current, state, e).await);
            }

            let started = Instant::now();
            debug!(step = %current, "Running step");
            let outcome = self.step(current).run(&state).await;
            let update = match outcome {
                Ok(update) => update,
                Err(e) => {
                    let run = RunContext { thread_id, run_id: &run_id, last_completed, turns: &turns };
                    return Err(self.fail(run, current, state, e).await);
                }
            };
            state.apply(update);
            last_completed = Some(current);

            self.event_bus.publish(PipelineEvent::StepCompleted {
                run_id: run_id.clone(),
                step: current,
                duration_ms: started.elapsed().as_millis() as u64,
                timestamp: Utc::now(),
            });

            let Some(next) = graph::next_step(current, &RouteSnapshot::of(&state), &self.policy) else {
                break;
            };

            let run = RunContext { thread_id, run_id: &run_id, last_completed, turns: &turns };
            if let Err(e) = self.checkpointer.put(run.checkpoint(&state, false)).await {
                return Err(RunFailure {
                    step: Some(current),
                    state: Box::new(state),
                    source: e.into(),
                });
            }

            current = next;
        }

        turns.push(LessonTurn::from_state(&state));
        if turns.len() > self.max_turns {
            let excess = turns.len() - self.max_turns;
            turns.drain(..excess);
        }

        let run = RunContext { thread_id, run_id: &run_id, last_completed, turns: &turns };
        if let Err(e) = self.checkpointer.put(run.checkpoint(&state, true)).await {
            return Err(RunFailure {
                step: Some(current),
                state: Box::new(state),
                source: e.into(),
            });
        }

        info!(
            thread_id = %thread_id,
            run_id = %run_id,
            tutor_iterations = state.iterations,
            score = ?state.faithfulness_score,
            source = %state.source_type,
            "Lesson run finished"
        );
        self.event_bus.publish(PipelineEvent::RunFinished {
            run_id,
            tutor_iterations: state.iterations,
            faithfulness_score: state.faithfulness_score,
            timestamp: Utc::now(),
        });

        Ok(state)
    }

    /// Record a failed run: checkpoint the partial state and publish the failure.
    async fn fail(
        &self,
        run: RunContext<'_>,
        step: StepName,
        state: LessonState,
        source: Error,
    ) -> RunFailure {
        warn!(thread_id = %run.thread_id, run_id = %run.run_id, step = %step, error = %source, "Lesson run failed");

        if let Err(e) = self.checkpointer.put(run.checkpoint(&state, false)).await {
            warn!(error = %e, "Failed to checkpoint partial state");
        }

        self.event_bus.publish(PipelineEvent::RunFailed {
            run_id: run.run_id.to_string(),
            step,
            error_message: source.to_string(),
            timestamp: Utc::now(),
        });

        RunFailure {
            step: Some(step),
            state: Box::new(state),
            source,
        }
    }
}

/// What a checkpoint write needs to know about the current run.
struct RunContext<'a> {
    thread_id: &'a ThreadId,
    run_id: &'a str,
    last_completed: Option<StepName>,
    turns: &'a [LessonTurn],
}

impl RunContext<'_> {
    fn checkpoint(&self, state: &LessonState, completed: bool) -> Checkpoint {
        let mut checkpoint = Checkpoint::new(self.thread_id.clone(), self.run_id, state.clone());
        checkpoint.last_step = self.last_completed;
        checkpoint.completed = completed;
        checkpoint.turns = self.turns.to_vec();
        checkpoint
    }
}

/// Wire a pipeline from configuration: provider router, search backend and
/// checkpoint store.
pub async fn build_from_config(config: &AppConfig) -> eduguardian_core::Result<LessonPipeline> {
    let router = eduguardian_providers::build_from_config(config);
    let provider = router.default().ok_or_else(|| Error::Config {
        message: format!("provider '{}' is not available", config.default_provider),
    })?;
    let search = eduguardian_search::build_from_config(config);
    let checkpointer = eduguardian_memory::build_from_config(config).await?;

    Ok(LessonPipeline::new(
        provider,
        search,
        checkpointer,
        PipelineSettings::from_config(config),
    ))
}
