//! 订单处理上下文
//!
//! 封装"我正在处理第几个订单、订单号是多少"这一信息

use std::fmt::Display;

/// 订单处理上下文
#[derive(Debug, Clone)]
pub struct OrderCtx {
    /// 订单号
    pub order_number: u32,

    /// 在 CSV 中的位置（从 1 开始，仅用于日志显示）
    pub position: usize,

    /// 订单总数
    pub total: usize,
}

impl OrderCtx {
    pub fn new(order_number: u32, position: usize, total: usize) -> Self {
        Self {
            order_number,
            position,
            total,
        }
    }
}

impl Display for OrderCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[订单 {}/{} #{}]",
            self.position, self.total, self.order_number
        )
    }
}
