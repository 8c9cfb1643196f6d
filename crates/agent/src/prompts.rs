//! Prompt text sent to the text-generation collaborator.

use eduguardian_core::LessonState;

/// Prefix of the Judge prompt. Test fakes route on it.
pub const JUDGE_PREFIX: &str = "Does the lesson below match the context?";

/// Prefix of the Quiz Master prompt.
pub const QUIZ_PREFIX: &str = "Generate 1 MCQ based on:";

pub fn tutor(state: &LessonState) -> String {
    let feedback = if state.judge_feedback.is_empty() {
        "None"
    } else {
        state.judge_feedback.as_str()
    };

    format!(
        "Context: {context}\n\
         Target: {level} student ({profile})\n\
         Query: {query}\n\
         \n\
         Task: Explain this topic.\n\
         1. Start with a Socratic question.\n\
         2. Use an analogy drawn from the student's interests above.\n\
         3. Bold key terms.\n\
         Feedback from Judge: {feedback}",
        context = state.context,
        level = state.student_level,
        profile = state.student_profile,
        query = state.query,
    )
}

pub fn judge(context: &str, response: &str) -> String {
    format!("{JUDGE_PREFIX} Score 0-1 (Number only).\nContext: {context}\nLesson: {response}")
}

pub fn quiz(response: &str) -> String {
    format!("{QUIZ_PREFIX} {response}")
}
