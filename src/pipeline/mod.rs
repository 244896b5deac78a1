pub mod extraction;
pub mod storage;
pub mod llm;
pub mod audit;
