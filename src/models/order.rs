use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::models::head::HeadOption;

/// CSV 中的一行原始数据
#[derive(Debug, Clone, Deserialize)]
pub struct OrderRow {
    #[serde(rename = "Order number")]
    pub order_number: String,
    #[serde(rename = "Head")]
    pub head: String,
    #[serde(rename = "Body")]
    pub body: String,
    #[serde(rename = "Legs")]
    pub legs: String,
    #[serde(rename = "Address")]
    pub address: String,
}

/// 经过校验的订单
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// 订单号，同时用作回执和截图的文件名
    pub order_number: u32,
    pub head: HeadOption,
    /// 身体型号在单选列表中的位置（从 1 开始）
    pub body: u32,
    /// 腿部零件编号
    pub legs: String,
    pub address: String,
}

impl Order {
    /// 从原始行转换
    ///
    /// `row_index` 是数据行序号（从 1 开始，不含表头），只用于错误信息
    pub fn from_row(row: OrderRow, row_index: usize) -> AppResult<Self> {
        let order_number = row.order_number.trim().parse::<u32>().map_err(|_| {
            AppError::Feed(format!(
                "第 {} 行: 订单号 '{}' 不是有效整数",
                row_index, row.order_number
            ))
        })?;

        let head = HeadOption::from_key(&row.head).ok_or_else(|| {
            AppError::Feed(format!(
                "第 {} 行 (订单 {}): 未知的头部型号 '{}'",
                row_index, order_number, row.head
            ))
        })?;

        let body = row
            .body
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|b| *b > 0)
            .ok_or_else(|| {
                AppError::Feed(format!(
                    "第 {} 行 (订单 {}): 身体型号 '{}' 不是正整数",
                    row_index, order_number, row.body
                ))
            })?;

        Ok(Self {
            order_number,
            head,
            body,
            legs: row.legs,
            address: row.address,
        })
    }
}
