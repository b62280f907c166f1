//! Task prompts and JSON response schemas, one pair per collaborator.

use ageverify_types::AnalysisAttributes;
use serde_json::{json, Value};

pub const LIVENESS_PROMPT: &str = "Perform a strict liveness check on this sequence of images. \
The subject was asked to look at the camera, then perform a series of random head movements. \
Decide whether this is a live person following the instructions or a spoof attempt such as a \
static photo or a replayed video. Judge the consistency of the person across frames, lighting \
changes, and subtle cues of liveness. Respond only with a JSON object.";

pub const ANALYSIS_PROMPT: &str = "Analyze the person in this image and estimate their details. \
Respond only with a JSON object containing: age, gender, emotion, wearingGlasses, facialHair, \
hairColor, faceShape, ethnicity, skinTone, eyeColor, distinguishingMarks.";

const RECONCILE_INSTRUCTIONS: &str = "You are a security verification agent. You received two \
independent analyses (A and B) of a person, made from two images taken seconds apart during one \
verification. Decide whether they are consistent enough to describe the same person. Key \
identifiers must agree: age (within a few years), gender, hairColor, ethnicity and facialHair. \
Minor variation in emotion is acceptable. If consistent, merge them into one finalAnalysis \
object, using Analysis A as the primary source; otherwise set finalAnalysis to null.";

/// Reconciliation prompt with both records embedded as JSON.
pub fn reconcile_prompt(
    a: &AnalysisAttributes,
    b: &AnalysisAttributes,
) -> Result<String, serde_json::Error> {
    Ok(format!(
        "{RECONCILE_INSTRUCTIONS}\n\nAnalysis A: {}\nAnalysis B: {}\n\nRespond only with a JSON object.",
        serde_json::to_string(a)?,
        serde_json::to_string(b)?,
    ))
}

pub fn liveness_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "livenessVerified": {
                "type": "BOOLEAN",
                "description": "True only if highly confident this is a live person."
            },
            "reason": {
                "type": "STRING",
                "description": "Brief explanation, e.g. 'Consistent head movement detected'."
            }
        },
        "required": ["livenessVerified", "reason"]
    })
}

fn attribute_properties() -> Value {
    json!({
        "age": { "type": "INTEGER", "description": "Estimated age in years." },
        "gender": { "type": "STRING" },
        "emotion": { "type": "STRING" },
        "wearingGlasses": { "type": "BOOLEAN" },
        "facialHair": { "type": "STRING" },
        "hairColor": { "type": "STRING" },
        "faceShape": { "type": "STRING" },
        "ethnicity": { "type": "STRING" },
        "skinTone": { "type": "STRING" },
        "eyeColor": { "type": "STRING" },
        "distinguishingMarks": { "type": "STRING" }
    })
}

pub fn analysis_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": attribute_properties(),
        "required": [
            "age", "gender", "emotion", "wearingGlasses", "facialHair", "hairColor",
            "faceShape", "ethnicity", "skinTone", "eyeColor", "distinguishingMarks"
        ]
    })
}

pub fn reconcile_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "verificationPassed": {
                "type": "BOOLEAN",
                "description": "True if the analyses are consistent and describe the same person."
            },
            "isConsistent": { "type": "BOOLEAN" },
            "finalAnalysis": {
                "type": "OBJECT",
                "nullable": true,
                "properties": attribute_properties()
            },
            "reason": {
                "type": "STRING",
                "description": "Brief explanation, especially on failure."
            }
        },
        "required": ["verificationPassed", "isConsistent", "finalAnalysis", "reason"]
    })
}
