//! Identifiers and layouts of the source extracts.

use serde::{Deserialize, Serialize};

/// One source extract delivered by the CRM or ERP system
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SourceId {
    #[serde(rename = "crm_cust_info")]
    CrmCustInfo,
    #[serde(rename = "crm_prd_info")]
    CrmPrdInfo,
    #[serde(rename = "crm_sales_details")]
    CrmSalesDetails,
    #[serde(rename = "erp_cust_az12")]
    ErpCustAz12,
    #[serde(rename = "erp_loc_a101")]
    ErpLocA101,
    #[serde(rename = "erp_px_cat_g1v2")]
    ErpPxCatG1v2,
}

impl SourceId {
    /// Every source, in load order
    pub const ALL: [Self; 6] = [
        Self::CrmCustInfo,
        Self::CrmPrdInfo,
        Self::CrmSalesDetails,
        Self::ErpCustAz12,
        Self::ErpLocA101,
        Self::ErpPxCatG1v2,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CrmCustInfo => "crm_cust_info",
            Self::CrmPrdInfo => "crm_prd_info",
            Self::CrmSalesDetails => "crm_sales_details",
            Self::ErpCustAz12 => "erp_cust_az12",
            Self::ErpLocA101 => "erp_loc_a101",
            Self::ErpPxCatG1v2 => "erp_px_cat_g1v2",
        }
    }

    pub fn parse_source(s: &str) -> Option<Self> {
        let wanted = s.trim().to_lowercase();
        Self::ALL.into_iter().find(|id| id.as_str() == wanted)
    }

    /// Expected header of the extract, in column order
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Self::CrmCustInfo => &[
                "cst_id",
                "cst_key",
                "cst_firstname",
                "cst_lastname",
                "cst_marital_status",
                "cst_gndr",
                "cst_create_date",
            ],
            Self::CrmPrdInfo => &[
                "prd_id",
                "prd_key",
                "prd_nm",
                "prd_cost",
                "prd_line",
                "prd_start_dt",
                "prd_end_dt",
            ],
            Self::CrmSalesDetails => &[
                "sls_ord_num",
                "sls_prd_key",
                "sls_cust_id",
                "sls_order_dt",
                "sls_ship_dt",
                "sls_due_dt",
                "sls_sales",
                "sls_quantity",
                "sls_price",
            ],
            Self::ErpCustAz12 => &["cid", "bdate", "gen"],
            Self::ErpLocA101 => &["cid", "cntry"],
            Self::ErpPxCatG1v2 => &["id", "cat", "subcat", "maintenance"],
        }
    }

    /// File name used when a pipeline spec gives no override
    pub fn default_file_name(&self) -> String {
        format!("{}.csv", self.as_str())
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_source_roundtrip() {
        for id in SourceId::ALL {
            assert_eq!(SourceId::parse_source(id.as_str()), Some(id));
        }
        assert_eq!(SourceId::parse_source(" CRM_CUST_INFO "), Some(SourceId::CrmCustInfo));
        assert_eq!(SourceId::parse_source("erp_unknown"), None);
    }

    #[test]
    fn test_serde_uses_source_names() {
        let json = serde_json::to_string(&SourceId::ErpPxCatG1v2).unwrap();
        assert_eq!(json, "\"erp_px_cat_g1v2\"");
    }

    #[test]
    fn test_default_file_name() {
        assert_eq!(SourceId::ErpLocA101.default_file_name(), "erp_loc_a101.csv");
        assert_eq!(SourceId::CrmSalesDetails.columns().len(), 9);
    }
}
