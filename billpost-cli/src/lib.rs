//! billpost-cli 라이브러리 — 명령 핸들러와 출력 추상화
//!
//! 통합 테스트에서 명령 핸들러를 직접 호출할 수 있도록 모듈을
//! 노출합니다. 바이너리 진입점은 `main.rs`입니다.

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;
