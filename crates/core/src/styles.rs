use crate::progress::Stage;

/// Configuration of one of the three drafting styles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyleConfig {
    pub system_prompt: &'static str,
    pub temperature: f32,
    pub label: &'static str,
    pub progress_stage: Stage,
    pub verification_stage: Stage,
}

pub const ACADEMIC: StyleConfig = StyleConfig {
    system_prompt: "You are a professional content creator who writes high-quality, formal articles with academic rigor.",
    temperature: 0.5,
    label: "Academic Style",
    progress_stage: Stage::GenerationAcademic,
    verification_stage: Stage::AcademicVerification,
};

pub const CREATIVE: StyleConfig = StyleConfig {
    system_prompt: "You are a creative storyteller who writes engaging, narrative-driven content that captivates readers.",
    temperature: 0.8,
    label: "Creative Style",
    progress_stage: Stage::GenerationCreative,
    verification_stage: Stage::CreativeVerification,
};

pub const TECHNICAL: StyleConfig = StyleConfig {
    system_prompt: "You are a technical expert who writes clear, concise, and informative content with practical insights.",
    temperature: 0.3,
    label: "Technical Style",
    progress_stage: Stage::GenerationTechnical,
    verification_stage: Stage::TechnicalVerification,
};

/// The drafting styles, in the order their drafts are handed to the refiner.
pub const STYLES: [StyleConfig; 3] = [ACADEMIC, CREATIVE, TECHNICAL];
