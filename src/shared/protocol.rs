//! 订单簿的数据类型：订单方向、订单、成交回报

use serde::{Deserialize, Serialize};
use std::fmt;

/// 支持的ticker数量（ticker id 取值 0..TICKER_COUNT）
pub const TICKER_COUNT: usize = 1024;

/// 每个队列的默认容量
pub const DEFAULT_QUEUE_CAPACITY: usize = 128;

/// 最低价格（含）
pub const MIN_PRICE: u32 = 10;

/// 最高价格（含）
pub const MAX_PRICE: u32 = 1000;

/// 价格档位数量，撮合时的桶排序按此宽度分桶
pub const PRICE_LEVELS: usize = (MAX_PRICE - MIN_PRICE + 1) as usize;

/// 订单方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// 指标标签
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 订单
///
/// 值类型，在队列槽位和撮合缓冲区之间按值移动。
/// `quantity` 为剩余未成交数量，只在撮合过程中被扣减。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub side: Side,
    pub ticker: u32,
    pub quantity: u32,
    // 整数价格，范围 [MIN_PRICE, MAX_PRICE]
    pub price: u32,
}

impl Order {
    pub fn new(side: Side, ticker: u32, quantity: u32, price: u32) -> Self {
        Self {
            side,
            ticker,
            quantity,
            price,
        }
    }

    /// 是否已完全成交
    #[inline]
    pub fn is_filled(&self) -> bool {
        self.quantity == 0
    }
}

/// 成交回报
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
    /// 本订单簿内单调递增的成交序号
    pub fill_id: u64,
    pub ticker: u32,
    // 撮合数量
    pub quantity: u32,
    // 撮合价格（卖方挂单价）
    pub price: u32,
}
