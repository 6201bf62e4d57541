// Refinement Request Client
// Implements: AI-pattern scan, prompt construction, structured refinement, normalization.
// All LLM calls go through llm_client; no direct Gemini calls here.

pub mod highlight;
pub mod models;
pub mod params;
pub mod prompts;
pub mod refiner;
pub mod scanner;
