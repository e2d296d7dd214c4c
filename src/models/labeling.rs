//! Эвристические названия кластеров

/// Правило: условие на (средняя цена, средние продажи) -> название
pub struct LabelRule {
    pub label: &'static str,
    pub matches: fn(avg_price: f64, avg_units: f64) -> bool,
}

pub const FALLBACK_LABEL: &str = "Premium Products";
pub const EMPTY_CLUSTER_LABEL: &str = "Empty Cluster";

/// Проверяются сверху вниз, первое совпадение побеждает
pub const LABEL_RULES: &[LabelRule] = &[
    LabelRule {
        label: "Budget Best-Sellers",
        matches: |price, units| price < 3.0 && units > 500.0,
    },
    LabelRule {
        label: "Premium Low-Volume",
        matches: |price, units| price > 7.0 && units < 200.0,
    },
    LabelRule {
        label: "Mid-Range Steady",
        matches: |price, _| (3.0..=7.0).contains(&price),
    },
    LabelRule {
        label: "High-Volume Movers",
        matches: |_, units| units > 600.0,
    },
];

pub fn label_for(avg_price: f64, avg_units: f64) -> &'static str {
    LABEL_RULES
        .iter()
        .find(|rule| (rule.matches)(avg_price, avg_units))
        .map(|rule| rule.label)
        .unwrap_or(FALLBACK_LABEL)
}

/// Пустой кластер не проходит через таблицу правил
pub fn label_cluster(count: usize, avg_price: f64, avg_units: f64) -> &'static str {
    if count == 0 {
        EMPTY_CLUSTER_LABEL
    } else {
        label_for(avg_price, avg_units)
    }
}
