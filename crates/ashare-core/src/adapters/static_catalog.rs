use async_trait::async_trait;

use crate::data_source::{CapabilitySet, DataSource, SearchRequest, SourceError};
use crate::{ProviderId, StockListing, Symbol};

/// Built-in large-cap catalog. Last tier of the stock-list and search
/// chains so those actions still answer when every provider is down.
pub struct StaticCatalog;

/// (code, name, industry) rows for a handful of index heavyweights.
const CATALOG: [(&str, &str, &str); 20] = [
    ("600000", "浦发银行", "银行"),
    ("600016", "民生银行", "银行"),
    ("600019", "宝钢股份", "钢铁行业"),
    ("600028", "中国石化", "石油行业"),
    ("600030", "中信证券", "证券"),
    ("600036", "招商银行", "银行"),
    ("600048", "保利发展", "房地产开发"),
    ("600104", "上汽集团", "汽车整车"),
    ("600519", "贵州茅台", "酿酒行业"),
    ("600887", "伊利股份", "食品饮料"),
    ("601318", "中国平安", "保险"),
    ("601398", "工商银行", "银行"),
    ("601857", "中国石油", "石油行业"),
    ("601988", "中国银行", "银行"),
    ("000001", "平安银行", "银行"),
    ("000002", "万科A", "房地产开发"),
    ("000333", "美的集团", "家电行业"),
    ("000651", "格力电器", "家电行业"),
    ("000858", "五粮液", "酿酒行业"),
    ("002594", "比亚迪", "汽车整车"),
];

impl StaticCatalog {
    pub fn new() -> Self {
        Self
    }

    fn listings() -> Vec<StockListing> {
        CATALOG
            .iter()
            .map(|&(code, name, industry)| {
                StockListing::from_columns(
                    Symbol::normalize(code),
                    name,
                    Some(industry.to_owned()),
                )
            })
            .collect()
    }
}

impl Default for StaticCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DataSource for StaticCatalog {
    fn id(&self) -> ProviderId {
        ProviderId::Static
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::new(false, false, true, true, false)
    }

    async fn probe(&self) -> Result<(), SourceError> {
        Ok(())
    }

    async fn stock_list(&self) -> Result<Vec<StockListing>, SourceError> {
        Ok(Self::listings())
    }

    /// Terminal tier: a keyword that matches nothing is still a valid
    /// answer, so the empty subset comes back as `Ok`.
    async fn search(&self, req: &SearchRequest) -> Result<Vec<StockListing>, SourceError> {
        Ok(Self::listings()
            .into_iter()
            .filter(|listing| listing.matches(&req.keyword))
            .collect())
    }
}
