//! The lesson state record and the partial updates steps return.
//!
//! One `LessonState` lives for the duration of a run. Steps never mutate it
//! directly: each returns a `LessonUpdate` that the pipeline merges with
//! [`LessonState::apply`]. Log lines in an update are appended, every other
//! populated field replaces the current value.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use crate::error::Error;

/// Education level of the student, fixed at run entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StudentLevel {
    #[default]
    Primary,
    Secondary,
    University,
}

impl StudentLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "Primary",
            Self::Secondary => "Secondary",
            Self::University => "University",
        }
    }
}

impl fmt::Display for StudentLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StudentLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "primary" => Ok(Self::Primary),
            "secondary" => Ok(Self::Secondary),
            "university" => Ok(Self::University),
            other => Err(Error::InvalidInput(format!(
                "unknown student level '{other}' (expected primary, secondary or university)"
            ))),
        }
    }
}

/// Where the lesson context came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SourceType {
    Local,
    #[serde(rename = "Web Search")]
    WebSearch,
    #[default]
    None,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "Local",
            Self::WebSearch => "Web Search",
            Self::None => "None",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Names of the nodes in the lesson graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepName {
    Memory,
    Sentinel,
    WebSearch,
    Tutor,
    Judge,
    QuizMaster,
}

impl StepName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Sentinel => "sentinel",
            Self::WebSearch => "web_search",
            Self::Tutor => "tutor",
            Self::Judge => "judge",
            Self::QuizMaster => "quiz_master",
        }
    }
}

impl fmt::Display for StepName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a caller supplies to start a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonRequest {
    pub query: String,

    #[serde(default)]
    pub student_level: StudentLevel,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_profile: Option<String>,
}

impl LessonRequest {
    pub fn new(query: impl Into<String>, student_level: StudentLevel) -> Self {
        Self {
            query: query.into(),
            student_level,
            student_profile: None,
        }
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.student_profile = Some(profile.into());
        self
    }

    /// Reject requests the pipeline cannot meaningfully run.
    pub fn validate(&self) -> Result<(), Error> {
        if self.query.trim().is_empty() {
            return Err(Error::InvalidInput("query must not be empty".into()));
        }
        Ok(())
    }
}

/// The state record threaded through every step of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LessonState {
    pub query: String,

    #[serde(default)]
    pub context: String,

    #[serde(default)]
    pub response: String,

    #[serde(default)]
    pub quiz_question: String,

    #[serde(default)]
    pub student_level: StudentLevel,

    #[serde(default)]
    pub student_profile: String,

    /// Set only by the Judge step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faithfulness_score: Option<f64>,

    #[serde(default)]
    pub judge_feedback: String,

    #[serde(default)]
    pub source_type: SourceType,

    #[serde(default)]
    pub reasoning_log: Vec<String>,

    #[serde(default)]
    pub image_url: String,

    /// Number of Tutor invocations in this run.
    #[serde(default)]
    pub iterations: u32,
}

impl LessonState {
    /// Fresh state for a new run.
    pub fn from_request(request: &LessonRequest) -> Self {
        Self {
            query: request.query.trim().to_string(),
            student_level: request.student_level,
            student_profile: request.student_profile.clone().unwrap_or_default(),
            ..Self::default()
        }
    }

    /// Merge a step's partial update into this state.
    pub fn apply(&mut self, update: LessonUpdate) {
        if let Some(context) = update.context {
            self.context = context;
        }
        if let Some(response) = update.response {
            self.response = response;
        }
        if let Some(quiz) = update.quiz_question {
            self.quiz_question = quiz;
        }
        if let Some(profile) = update.student_profile {
            self.student_profile = profile;
        }
        if let Some(score) = update.faithfulness_score {
            self.faithfulness_score = Some(score);
        }
        if let Some(feedback) = update.judge_feedback {
            self.judge_feedback = feedback;
        }
        if let Some(source) = update.source_type {
            self.source_type = source;
        }
        if let Some(image) = update.image_url {
            self.image_url = image;
        }
        if let Some(iterations) = update.iterations {
            self.iterations = iterations;
        }
        self.reasoning_log.extend(update.log);
    }
}

/// A partial update returned by a step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LessonUpdate {
    pub context: Option<String>,
    pub response: Option<String>,
    pub quiz_question: Option<String>,
    pub student_profile: Option<String>,
    pub faithfulness_score: Option<f64>,
    pub judge_feedback: Option<String>,
    pub source_type: Option<SourceType>,
    pub image_url: Option<String>,
    pub iterations: Option<u32>,
    /// Lines appended to the reasoning log
    pub log: Vec<String>,
}

impl LessonUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(mut self, line: impl Into<String>) -> Self {
        self.log.push(line.into());
        self
    }

    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn response(mut self, response: impl Into<String>) -> Self {
        self.response = Some(response.into());
        self
    }

    pub fn quiz_question(mut self, quiz: impl Into<String>) -> Self {
        self.quiz_question = Some(quiz.into());
        self
    }

    pub fn student_profile(mut self, profile: impl Into<String>) -> Self {
        self.student_profile = Some(profile.into());
        self
    }

    pub fn faithfulness(mut self, score: f64, feedback: impl Into<String>) -> Self {
        self.faithfulness_score = Some(score);
        self.judge_feedback = Some(feedback.into());
        self
    }

    pub fn source_type(mut self, source: SourceType) -> Self {
        self.source_type = Some(source);
        self
    }

    pub fn image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    pub fn iterations(mut self, iterations: u32) -> Self {
        self.iterations = Some(iterations);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_parses_case_insensitively() {
        assert_eq!("primary".parse::<StudentLevel>().unwrap(), StudentLevel::Primary);
        assert_eq!(" University ".parse::<StudentLevel>().unwrap(), StudentLevel::University);
        assert!(matches!(
            "kindergarten".parse::<StudentLevel>(),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn source_type_serializes_with_space() {
        let json = serde_json::to_string(&SourceType::WebSearch).unwrap();
        assert_eq!(json, "\"Web Search\"");
        let back: SourceType = serde_json::from_str("\"Web Search\"").unwrap();
        assert_eq!(back, SourceType::WebSearch);
    }

    #[test]
    fn empty_query_is_rejected() {
        let req = LessonRequest::new("   ", StudentLevel::Secondary);
        assert!(matches!(req.validate(), Err(Error::InvalidInput(_))));
        assert!(LessonRequest::new("Explain gravity", StudentLevel::Secondary)
            .validate()
            .is_ok());
    }

    #[test]
    fn from_request_starts_clean() {
        let req = LessonRequest::new("  Explain gravity ", StudentLevel::University)
            .with_profile("Likes football");
        let state = LessonState::from_request(&req);
        assert_eq!(state.query, "Explain gravity");
        assert_eq!(state.student_profile, "Likes football");
        assert_eq!(state.iterations, 0);
        assert!(state.context.is_empty());
        assert!(state.faithfulness_score.is_none());
        assert_eq!(state.source_type, SourceType::None);
    }

    #[test]
    fn apply_appends_log_and_replaces_fields() {
        let mut state = LessonState::from_request(&LessonRequest::new("q", StudentLevel::Primary));
        state.apply(LessonUpdate::new().context("ctx").log("first"));
        state.apply(
            LessonUpdate::new()
                .response("draft")
                .iterations(1)
                .log("second"),
        );
        state.apply(LessonUpdate::new().context("other"));

        assert_eq!(state.context, "other");
        assert_eq!(state.response, "draft");
        assert_eq!(state.iterations, 1);
        assert_eq!(state.reasoning_log, vec!["first", "second"]);
    }

    #[test]
    fn empty_update_changes_nothing() {
        let mut state = LessonState::from_request(&LessonRequest::new("q", StudentLevel::Primary));
        state.apply(LessonUpdate::new().faithfulness(0.4, "Hallucination detected. Revising..."));
        let before = state.clone();
        state.apply(LessonUpdate::new());
        assert_eq!(state, before);
    }
}
