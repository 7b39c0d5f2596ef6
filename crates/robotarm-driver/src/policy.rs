//! 命令失败处理策略
//!
//! 驱动本身只返回错误，不决定是否继续。调用方（例如 CLI）通过
//! `ErrorPolicy` 显式选择：记录后继续，或者立即中止。

use tracing::warn;

use crate::error::ArmError;

/// 命令失败时的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// 记录警告后继续（默认）
    #[default]
    Continue,
    /// 将错误向上传播
    Abort,
}

impl ErrorPolicy {
    pub fn from_strict(strict: bool) -> Self {
        if strict {
            ErrorPolicy::Abort
        } else {
            ErrorPolicy::Continue
        }
    }

    /// 按策略处理一次命令的结果
    ///
    /// 以下错误在任何策略下都会传播：
    /// - `SafetyStopFailed`：机械臂可能仍在运动
    /// - 设备已断开或无权限（[`ArmError::is_fatal`]）：继续没有意义
    pub fn apply(self, result: Result<(), ArmError>) -> Result<(), ArmError> {
        match result {
            Ok(()) => Ok(()),
            Err(e) if e.is_unsafe() || e.is_fatal() => Err(e),
            Err(e) => match self {
                ErrorPolicy::Continue => {
                    warn!("Command failed, continuing: {}", e);
                    Ok(())
                },
                ErrorPolicy::Abort => Err(e),
            },
        }
    }
}
