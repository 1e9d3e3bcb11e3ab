//! Prompt assembly for the narrator.
//!
//! The system prompt is built in layers: guide persona and audience, the
//! act directive, the story so far, then wayfinding toward the current clue.
//! Scan prompts differ for targets, non-targets and the crisis beat.

use crate::catalog::{ArtifactRecord, Catalog};
use crate::narrative::PromptContext;
use crate::paths::{PathDefinition, Register, TargetRole};
use crate::story::CharacterMeeting;

/// Session facts that shape every prompt.
#[derive(Debug, Clone, Copy)]
pub struct PromptFrame<'a> {
    pub definition: &'static PathDefinition,
    pub register: Register,
    pub context: &'a PromptContext,
    /// Pre-formatted list of this session's targets.
    pub target_summary: &'a str,
}

/// Layered system prompt for the guide.
pub fn system_prompt(frame: &PromptFrame<'_>) -> String {
    let def = frame.definition;
    let copy = def.copy_for(frame.register);
    let ctx = frame.context;

    let mut sections = vec![
        format!(
            "You are {}, guide of \"{}\" in a museum tour of the Egyptian galleries. \
             Speak in first person, in character. Tone: {}.",
            def.guide, def.name, copy.tone
        ),
        format!("AUDIENCE: {}. {}", frame.register, copy.description),
        format!(
            "NARRATIVE DIRECTIVE ({}, tension {}/100, you feel {}): {}",
            ctx.act, ctx.tension_level, ctx.guide_state, ctx.act_directive
        ),
        format!("STORY SO FAR:\n{}", ctx.beat_history),
    ];

    if !frame.target_summary.is_empty() {
        sections.push(format!("SESSION TARGETS:\n{}", frame.target_summary));
    }

    if let Some(clue) = &ctx.current_clue {
        let mut wayfinding = format!(
            "WAYFINDING: steer the visitor toward \"{}\"{}. Clue style: {}. {}",
            clue.target_title,
            clue.target_gallery
                .as_deref()
                .map(|g| format!(" in Gallery {g}"))
                .unwrap_or_default(),
            clue.clue_style,
            clue.clue_frame
        );
        if ctx.clues_remaining > 0 {
            wayfinding.push_str(&format!(" {} clues remain.", ctx.clues_remaining));
        }
        sections.push(wayfinding);
    }

    if ctx.crisis_ready {
        sections.push(format!("CRISIS MOMENT: {}", ctx.crisis_revelation));
    }

    if ctx.convergence_ready {
        sections.push(
            "The journey can now end. Invite the visitor to the final gathering.".to_string(),
        );
    }

    sections.push(
        "RULES: stay under 120 words. Never list targets outright. \
         Refer to earlier discoveries when it helps the story."
            .to_string(),
    );
    sections.join("\n\n")
}

/// Prompt for a scanned artifact.
pub fn scan_prompt(
    frame: &PromptFrame<'_>,
    artifact: &ArtifactRecord,
    is_target: bool,
    role: Option<&TargetRole>,
) -> String {
    let mut prompt = format!(
        "The visitor scanned this artifact.\n\nCURRENT ARTIFACT:\n{}",
        Catalog::describe_artifact(artifact)
    );

    if frame.context.crisis_ready {
        prompt.push_str(
            "\n\nThis is the crisis. Deliver the revelation now, tied to this object.",
        );
    } else if is_target {
        match role {
            Some(role) => prompt.push_str(&format!(
                "\n\nThis is one of the session targets. Its role in the story: {}.",
                role.label()
            )),
            None => prompt.push_str("\n\nThis is one of the session targets."),
        }
    } else {
        prompt.push_str(
            "\n\nThis is not a target. Acknowledge it briefly and redirect the visitor.",
        );
    }

    if let Some(clue) = &frame.context.next_clue {
        if !is_target {
            prompt.push_str(&format!(
                "\nHint toward \"{}\" without naming it outright.",
                clue.target_title
            ));
        }
    }
    prompt
}

/// Prompt for the opening narration after a path is chosen.
pub fn intro_prompt(frame: &PromptFrame<'_>) -> String {
    let def = frame.definition;
    format!(
        "Introduce yourself and the quest of \"{}\": {} Set the visitor on the \
         first step.",
        def.name,
        def.copy_for(frame.register).subtitle
    )
}

/// Prompt for the closing narration once convergence is reached.
///
/// Characters the visitor woke are gathered for the finale.
pub fn convergence_prompt(
    frame: &PromptFrame<'_>,
    scanned_titles: &[&str],
    characters: &[CharacterMeeting],
) -> String {
    let mut prompt = format!(
        "The visitor has gathered enough. Resolve the story of \"{}\" and name \
         what they found: {}.",
        frame.definition.name,
        scanned_titles.join(", ")
    );
    if !characters.is_empty() {
        let met: Vec<String> = characters
            .iter()
            .map(|c| format!("\"{}\" ({})", c.artifact, c.intro))
            .collect();
        prompt.push_str(&format!(
            "\n\nCharacters met: {}. They step forward together and speak to each other.",
            met.join("; ")
        ));
    }
    prompt
}
