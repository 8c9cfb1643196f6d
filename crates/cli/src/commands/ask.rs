//! `eduguardian ask`: run one lesson through the pipeline.

use eduguardian_config::AppConfig;
use eduguardian_core::{LessonRequest, LessonState, StudentLevel, ThreadId};

pub async fn run(
    query: String,
    level: &str,
    profile: Option<String>,
    thread: Option<String>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if !config.has_api_key() && !config.providers.values().any(|p| p.api_key.is_some()) {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    EDUGUARDIAN_API_KEY   (generic)");
        eprintln!("    GROQ_API_KEY          (Groq, the default provider)");
        eprintln!("    OPENAI_API_KEY        (OpenAI direct)");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_path().display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let level: StudentLevel = level.parse()?;
    let mut request = LessonRequest::new(query, level);
    if let Some(profile) = profile {
        request = request.with_profile(profile);
    }

    let thread_id = thread.map(ThreadId::from).unwrap_or_default();
    let pipeline = eduguardian_agent::build_from_config(&config).await?;

    eprint!("  Thinking...");
    let outcome = pipeline.invoke(&thread_id, request).await;
    eprint!("\r              \r");

    let lesson = match outcome {
        Ok(lesson) => lesson,
        Err(failure) => {
            if !failure.state.reasoning_log.is_empty() {
                eprintln!("  Reasoning so far:");
                for line in &failure.state.reasoning_log {
                    eprintln!("    {line}");
                }
            }
            return Err(failure.into());
        }
    };

    if json {
        let body = serde_json::json!({
            "thread_id": thread_id.as_str(),
            "lesson": lesson,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        print!("{}", render(&thread_id, &lesson));
    }

    Ok(())
}

/// Human-readable rendering of a finished lesson.
fn render(thread_id: &ThreadId, lesson: &LessonState) -> String {
    let mut out = String::new();

    out.push_str("\n📖 Lesson\n");
    out.push_str("─────────\n");
    out.push_str(lesson.response.trim());
    out.push('\n');

    if !lesson.image_url.is_empty() {
        out.push_str(&format!("\n🖼️  Diagram: {}\n", lesson.image_url));
    }

    out.push_str("\n❓ Quiz\n");
    out.push_str("──────\n");
    out.push_str(lesson.quiz_question.trim());
    out.push('\n');

    out.push_str("\n🧭 Reasoning\n");
    for line in &lesson.reasoning_log {
        out.push_str(&format!("  {line}\n"));
    }

    let score = lesson
        .faithfulness_score
        .map(|s| format!("{s:.2}"))
        .unwrap_or_else(|| "n/a".into());
    out.push_str(&format!(
        "\n  Source: {}   Faithfulness: {}   Drafts: {}\n",
        lesson.source_type, score, lesson.iterations
    ));
    out.push_str(&format!("  Thread: {thread_id}\n"));

    out
}
