//! # 一時ファイル管理
//!
//! Mailgun はファイルパスで添付を受け取るため、メモリ上の内容しか持たない添付は
//! 送信前に一時ファイルへ書き出す必要がある。
//!
//! [`TempFileSet`] は 1 回の送信で作成した一時ファイルをすべて保持し、
//! [`release`](TempFileSet::release) または drop 時に必ず削除する。
//! 早期リターン・エラー・パニックのいずれの経路でも一時ファイルは残らない。

use std::{
    io::{self, Write as _},
    path::PathBuf,
};

use tempfile::NamedTempFile;

/// 1 回の送信の間だけ生存する一時ファイルの集合
#[derive(Debug, Default)]
pub struct TempFileSet {
    files: Vec<NamedTempFile>,
}

impl TempFileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// `content` を書き込んだ一時ファイルを作成し、そのパスを返す
    ///
    /// 作成したファイルはこの集合が所有し、解放時に削除される。
    pub fn create(&mut self, content: &[u8]) -> io::Result<PathBuf> {
        let mut file = NamedTempFile::with_prefix("omnimail-")?;
        file.write_all(content)?;
        file.flush()?;

        let path = file.path().to_path_buf();
        self.files.push(file);
        Ok(path)
    }

    /// 保持している一時ファイルの数
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// 保持しているすべての一時ファイルを閉じて削除する
    ///
    /// 削除に失敗したファイルは警告ログを出して読み飛ばす。
    /// 解放済みのファイルは集合から取り除かれるため、2 回目以降の呼び出しは何もしない。
    /// 戻り値は解放したファイル数。
    pub fn release(&mut self) -> usize {
        let released = self.files.len();

        for file in self.files.drain(..) {
            let path = file.path().to_path_buf();
            if let Err(e) = file.close() {
                tracing::warn!(
                    error = %e,
                    path = %path.display(),
                    "一時ファイルの削除に失敗"
                );
            }
        }

        released
    }
}

impl Drop for TempFileSet {
    fn drop(&mut self) {
        self.release();
    }
}
