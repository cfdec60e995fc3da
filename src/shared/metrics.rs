//! Prometheus Metrics Module
//!
//! 订单簿的核心运行指标
//!
//! ## 指标类型
//! - **Counter**: 订单总数、拒单总数、成交笔数与成交量、回灌丢单数
//! - **Histogram**: 单次撮合耗时
//! - **Gauge**: 队列中驻留的订单数（买/卖）
//!
//! ## 使用示例
//! ```rust,ignore
//! use lockfree_book::shared::metrics::METRICS;
//!
//! METRICS.orders_total.with_label_values(&["buy"]).inc();
//!
//! let start = Instant::now();
//! // ... 执行撮合 ...
//! METRICS.match_pass_duration.observe(start.elapsed().as_secs_f64() * 1_000_000.0);
//! ```

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_gauge_vec, register_histogram, register_int_counter,
    CounterVec, Encoder, GaugeVec, Histogram, IntCounter, TextEncoder,
};

lazy_static! {
    /// 全局Metrics实例
    pub static ref METRICS: Metrics = Metrics::new();
}

/// 订单簿核心指标
pub struct Metrics {
    /// 已接受订单总数 (按方向: buy/sell)
    pub orders_total: CounterVec,

    /// 拒单总数 (按原因)
    pub rejections_total: CounterVec,

    /// 成交笔数
    pub fills_total: IntCounter,

    /// 成交数量合计
    pub filled_quantity_total: IntCounter,

    /// 撮合后回灌时队列已满而丢弃的订单数
    pub reinjection_drops_total: IntCounter,

    /// 单个ticker一次撮合的耗时分布 (微秒)
    pub match_pass_duration: Histogram,

    /// 队列中驻留的订单数 (买/卖)
    pub resident_orders: GaugeVec,
}

impl Metrics {
    /// 创建并注册指标
    ///
    /// 指标注册到全局registry，重复注册会panic，只能通过 `METRICS` 访问。
    fn new() -> Self {
        Self {
            orders_total: register_counter_vec!(
                "orderbook_orders_total",
                "Total number of accepted orders",
                &["side"]
            )
            .expect("register orderbook_orders_total"),

            rejections_total: register_counter_vec!(
                "orderbook_rejections_total",
                "Total number of rejected submissions",
                &["reason"]
            )
            .expect("register orderbook_rejections_total"),

            fills_total: register_int_counter!(
                "orderbook_fills_total",
                "Total number of fills"
            )
            .expect("register orderbook_fills_total"),

            filled_quantity_total: register_int_counter!(
                "orderbook_filled_quantity_total",
                "Total filled quantity"
            )
            .expect("register orderbook_filled_quantity_total"),

            reinjection_drops_total: register_int_counter!(
                "orderbook_reinjection_drops_total",
                "Orders lost because their queue was full at re-injection"
            )
            .expect("register orderbook_reinjection_drops_total"),

            match_pass_duration: register_histogram!(
                "orderbook_match_pass_duration_microseconds",
                "Single ticker match pass duration in microseconds",
                vec![1.0, 5.0, 10.0, 50.0, 100.0, 500.0, 1000.0, 5000.0]
            )
            .expect("register orderbook_match_pass_duration_microseconds"),

            resident_orders: register_gauge_vec!(
                "orderbook_resident_orders",
                "Orders currently resting in the queues",
                &["side"]
            )
            .expect("register orderbook_resident_orders"),
        }
    }

    /// 导出Prometheus文本格式的指标
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = prometheus::gather();
        let mut buffer = vec![];
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_global() {
        METRICS.orders_total.with_label_values(&["buy"]).inc();

        let output = METRICS.export().unwrap();
        assert!(output.contains("orderbook_orders_total"));
    }

    #[test]
    fn test_histogram_global() {
        METRICS.match_pass_duration.observe(12.5);

        let output = METRICS.export().unwrap();
        assert!(output.contains("orderbook_match_pass_duration_microseconds"));
    }

    #[test]
    fn test_gauge_global() {
        METRICS.resident_orders.with_label_values(&["sell"]).set(3.0);

        // Note: 全局共享，不能假设值精确匹配
        let output = METRICS.export().unwrap();
        assert!(output.contains("orderbook_resident_orders"));
    }
}
