// 進捗報告
//
// 探索処理とユーザー向け表示を分離する。ログは `log` ファサード、
// 画面表示はこのトレイトの実装が担当する。

pub mod console;
pub mod traits;

#[cfg(test)]
pub mod test_mocks;

// 公開API
pub use console::{ConsoleProgressReporter, NoOpProgressReporter};
pub use traits::ProgressReporter;

// テストモック（テスト時のみ）
#[cfg(test)]
pub use test_mocks::RecordingProgressReporter;
