//! Leaf Doctor
//!
//! 葉の画像をビジョンAIに送り、返答を病害解析結果として返す。
//! CLI（`leaf-doctor`）とHTTP APIの両方から使う。

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod error;
pub mod payload;
pub mod scanner;
pub mod server;
