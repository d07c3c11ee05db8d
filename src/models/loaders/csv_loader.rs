use crate::error::{AppError, AppResult};
use crate::models::order::{Order, OrderRow};
use std::collections::HashSet;
use std::path::Path;
use tokio::fs;

/// 从 CSV 文件加载全部订单，保持文件中的行顺序
///
/// 整个文件先完成校验再返回，任何一行有问题都不会开始下单
pub async fn load_orders(csv_path: &Path) -> AppResult<Vec<Order>> {
    let content = fs::read_to_string(csv_path).await.map_err(|e| {
        AppError::Feed(format!("无法读取订单文件 {}: {}", csv_path.display(), e))
    })?;

    let orders = parse_orders(&content)?;
    tracing::info!(
        "成功加载 {} 个订单: {}",
        orders.len(),
        csv_path.display()
    );
    Ok(orders)
}

/// 解析 CSV 文本
pub fn parse_orders(content: &str) -> AppResult<Vec<Order>> {
    let mut reader = csv::Reader::from_reader(content.as_bytes());
    let mut orders = Vec::new();
    let mut seen = HashSet::new();

    for (index, record) in reader.deserialize::<OrderRow>().enumerate() {
        let row_index = index + 1;
        let row = record.map_err(|e| AppError::Feed(format!("第 {} 行解析失败: {}", row_index, e)))?;
        let order = Order::from_row(row, row_index)?;

        if !seen.insert(order.order_number) {
            return Err(AppError::Feed(format!(
                "第 {} 行: 订单号 {} 重复",
                row_index, order.order_number
            )));
        }

        tracing::debug!("第 {} 行: 订单 {} 校验通过", row_index, order.order_number);
        orders.push(order);
    }

    Ok(orders)
}
