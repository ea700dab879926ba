use crate::error::Result;
use crate::transaction::Category;
use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

/// A sellable catalog entry. Created at catalog load, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub price: Decimal,
    pub commission: Decimal,
    /// Electricity tokens only: estimated kWh delivered for the price.
    pub estimated_yield: Option<Decimal>,
}

impl Product {
    fn new(
        id: &str,
        name: &str,
        category: Category,
        price: Decimal,
        commission: Decimal,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            category,
            price,
            commission,
            estimated_yield: None,
        }
    }

    fn with_yield(mut self, kwh: Decimal) -> Self {
        self.estimated_yield = Some(kwh);
        self
    }
}

/// A telco operator and the phone prefixes that identify it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operator {
    pub id: &'static str,
    pub name: &'static str,
    pub prefixes: &'static [&'static str],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub id: &'static str,
    pub name: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Provider {
    pub id: &'static str,
    pub name: &'static str,
    pub category: Category,
}

/// The result of looking up a billable account. Synthesized locally and
/// deterministically; a real gateway client would return the same shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerRecord {
    pub identifier: String,
    pub category: Category,
    pub name: String,
    pub region: String,
    pub bill_amount: Decimal,
    pub admin_fee: Decimal,
    pub period: String,
    pub usage_kwh: Option<u32>,
    pub tariff: Option<String>,
    pub usage_m3: Option<u32>,
    pub family_members: Option<u32>,
    pub class: Option<u8>,
}

/// The catalog/lookup seam. The orchestrator only ever talks to this
/// trait, so a real network client can replace [`MockCatalog`] without
/// touching the state machine.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Ordered product list for a category. Bill categories have none;
    /// their amount comes from the looked-up bill.
    fn products_by_category(&self, category: Category) -> Vec<Product>;

    /// Resolve an identifier to a customer record. `None` is the normal
    /// not-found outcome, not an error.
    async fn lookup_customer(
        &self,
        category: Category,
        identifier: &str,
    ) -> Result<Option<CustomerRecord>>;

    /// Classify a (possibly partial) phone number. `None` while the
    /// prefix is too short or unrecognized.
    fn detect_operator(&self, phone: &str) -> Option<&Operator>;

    fn regions(&self, category: Category) -> &[Region];

    fn providers(&self, category: Category) -> Vec<&Provider>;
}

pub type CatalogBox = Box<dyn CatalogProvider>;

static OPERATORS: &[Operator] = &[
    Operator {
        id: "telkomsel",
        name: "Telkomsel",
        prefixes: &[
            "0811", "0812", "0813", "0821", "0822", "0851", "0852", "0853",
        ],
    },
    Operator {
        id: "indosat",
        name: "Indosat Ooredoo",
        prefixes: &[
            "0814", "0815", "0816", "0855", "0856", "0857", "0858",
        ],
    },
    Operator {
        id: "xl",
        name: "XL Axiata",
        prefixes: &["0817", "0818", "0819", "0859", "0877", "0878"],
    },
    Operator {
        id: "axis",
        name: "Axis",
        prefixes: &["0831", "0832", "0833", "0838"],
    },
    Operator {
        id: "tri",
        name: "Tri",
        prefixes: &["0895", "0896", "0897", "0898", "0899"],
    },
    Operator {
        id: "smartfren",
        name: "Smartfren",
        prefixes: &[
            "0881", "0882", "0883", "0884", "0885", "0886", "0887", "0888",
        ],
    },
    // by.U numbers share Telkomsel's 0851 block; the longer prefixes win.
    Operator {
        id: "byu",
        name: "by.U",
        prefixes: &["085115", "085116", "085117"],
    },
];

static PDAM_REGIONS: &[Region] = &[
    Region { id: "jakarta", name: "PDAM Jaya" },
    Region { id: "bandung", name: "PDAM Tirtawening" },
    Region { id: "surabaya", name: "PDAM Surya Sembada" },
    Region { id: "semarang", name: "PDAM Tirta Moedal" },
    Region { id: "medan", name: "PDAM Tirtanadi" },
    Region { id: "makassar", name: "PDAM Makassar" },
];

static PROVIDERS: &[Provider] = &[
    Provider { id: "halo", name: "Kartu Halo", category: Category::Pascabayar },
    Provider { id: "matrix", name: "Indosat Matrix", category: Category::Pascabayar },
    Provider { id: "xplor", name: "XL Prioritas", category: Category::Pascabayar },
    Provider { id: "ovo", name: "OVO", category: Category::EWallet },
    Provider { id: "gopay", name: "GoPay", category: Category::EWallet },
    Provider { id: "dana", name: "DANA", category: Category::EWallet },
    Provider { id: "shopeepay", name: "ShopeePay", category: Category::EWallet },
    Provider { id: "linkaja", name: "LinkAja", category: Category::EWallet },
    Provider { id: "ml", name: "Mobile Legends", category: Category::GameVoucher },
    Provider { id: "ff", name: "Free Fire", category: Category::GameVoucher },
    Provider { id: "pubg", name: "PUBG Mobile", category: Category::GameVoucher },
    Provider { id: "genshin", name: "Genshin Impact", category: Category::GameVoucher },
    Provider { id: "valorant", name: "Valorant", category: Category::GameVoucher },
];

static CUSTOMER_NAMES: &[&str] = &[
    "Budi Santoso",
    "Siti Aminah",
    "Agus Wijaya",
    "Dewi Lestari",
    "Rudi Hartono",
    "Sri Mulyani",
    "Joko Prasetyo",
    "Ratna Sari",
    "Hendra Gunawan",
    "Fitri Handayani",
    "Bambang Susilo",
    "Maya Puspita",
];

static MONTHS: &[&str] = &[
    "Januari",
    "Februari",
    "Maret",
    "April",
    "Mei",
    "Juni",
    "Juli",
    "Agustus",
    "September",
    "Oktober",
    "November",
    "Desember",
];

static TARIFFS: &[&str] = &["R1/900VA", "R1/1300VA", "R2/2200VA", "R3/3500VA"];

/// Local, deterministic catalog. Same identifier always yields the same
/// customer record.
#[derive(Default)]
pub struct MockCatalog;

impl MockCatalog {
    pub fn new() -> Self {
        Self
    }
}

/// FNV-1a over the identifier bytes. The synthesis key for every
/// customer field, so lookups are reproducible.
fn fold_identifier(identifier: &str) -> u64 {
    identifier.bytes().fold(0xcbf2_9ce4_8422_2325_u64, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0000_0100_0000_01b3)
    })
}

fn all_digits(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

/// Identifier shape rule per lookup category. Anything outside the shape
/// is the normal not-found outcome.
fn identifier_known(category: Category, identifier: &str) -> bool {
    if !all_digits(identifier) {
        return false;
    }
    let len = identifier.len();
    match category {
        Category::ElectricityBill => (11..=12).contains(&len),
        Category::Pascabayar => (10..=13).contains(&len),
        Category::Pdam => (6..=12).contains(&len),
        Category::Bpjs => len == 13,
        _ => false,
    }
}

fn synthesize_customer(category: Category, identifier: &str) -> CustomerRecord {
    let h = fold_identifier(identifier);
    let name = CUSTOMER_NAMES[(h % CUSTOMER_NAMES.len() as u64) as usize].to_string();
    let region_entry = PDAM_REGIONS[((h >> 8) % PDAM_REGIONS.len() as u64) as usize];
    let period = MONTHS[((h >> 16) % 12) as usize].to_string();
    let admin_fee = dec!(2_500);

    let mut record = CustomerRecord {
        identifier: identifier.to_string(),
        category,
        name,
        region: region_entry.name.to_string(),
        bill_amount: Decimal::ZERO,
        admin_fee,
        period,
        usage_kwh: None,
        tariff: None,
        usage_m3: None,
        family_members: None,
        class: None,
    };

    match category {
        Category::ElectricityBill => {
            let usage = 80 + (h % 220) as u32;
            record.usage_kwh = Some(usage);
            record.tariff = Some(TARIFFS[((h >> 24) % TARIFFS.len() as u64) as usize].to_string());
            record.bill_amount = dec!(50_000) + Decimal::from(h % 40) * dec!(5_000);
        }
        Category::Pascabayar => {
            record.bill_amount = dec!(45_000) + Decimal::from(h % 30) * dec!(2_500);
        }
        Category::Pdam => {
            let usage = 10 + (h % 40) as u32;
            record.usage_m3 = Some(usage);
            record.bill_amount = dec!(25_000) + Decimal::from(h % 20) * dec!(2_500);
        }
        Category::Bpjs => {
            let members = 1 + (h % 4) as u32;
            let class = 1 + ((h >> 32) % 3) as u8;
            let rate = match class {
                1 => dec!(150_000),
                2 => dec!(100_000),
                _ => dec!(42_000),
            };
            record.family_members = Some(members);
            record.class = Some(class);
            record.bill_amount = rate * Decimal::from(members);
        }
        _ => {}
    }
    record
}

fn pulsa_products() -> Vec<Product> {
    let c = Category::Pulsa;
    vec![
        Product::new("PLS5", "Pulsa 5.000", c, dec!(6_500), dec!(250)),
        Product::new("PLS10", "Pulsa 10.000", c, dec!(11_500), dec!(300)),
        Product::new("PLS20", "Pulsa 20.000", c, dec!(21_500), dec!(350)),
        Product::new("PLS25", "Pulsa 25.000", c, dec!(26_500), dec!(400)),
        Product::new("PLS50", "Pulsa 50.000", c, dec!(51_000), dec!(500)),
        Product::new("PLS100", "Pulsa 100.000", c, dec!(100_500), dec!(750)),
    ]
}

fn token_products() -> Vec<Product> {
    let c = Category::ElectricityToken;
    vec![
        Product::new("TKN20", "Token Listrik 20.000", c, dec!(20_000), dec!(1_500))
            .with_yield(dec!(13.0)),
        Product::new("TKN50", "Token Listrik 50.000", c, dec!(50_000), dec!(2_500))
            .with_yield(dec!(32.9)),
        Product::new("TKN100", "Token Listrik 100.000", c, dec!(100_000), dec!(3_000))
            .with_yield(dec!(66.4)),
        Product::new("TKN200", "Token Listrik 200.000", c, dec!(200_000), dec!(4_000))
            .with_yield(dec!(133.4)),
        Product::new("TKN500", "Token Listrik 500.000", c, dec!(500_000), dec!(5_000))
            .with_yield(dec!(334.1)),
        Product::new("TKN1000", "Token Listrik 1.000.000", c, dec!(1_000_000), dec!(7_500))
            .with_yield(dec!(669.5)),
    ]
}

fn ewallet_products() -> Vec<Product> {
    let c = Category::EWallet;
    vec![
        Product::new("EWL10", "Top Up 10.000", c, dec!(11_000), dec!(400)),
        Product::new("EWL25", "Top Up 25.000", c, dec!(26_000), dec!(450)),
        Product::new("EWL50", "Top Up 50.000", c, dec!(51_000), dec!(500)),
        Product::new("EWL100", "Top Up 100.000", c, dec!(101_000), dec!(600)),
        Product::new("EWL200", "Top Up 200.000", c, dec!(201_000), dec!(750)),
        Product::new("EWL500", "Top Up 500.000", c, dec!(501_000), dec!(1_000)),
    ]
}

fn game_products() -> Vec<Product> {
    let c = Category::GameVoucher;
    vec![
        Product::new("ML86", "ML 86 Diamonds", c, dec!(22_000), dec!(1_000)),
        Product::new("ML172", "ML 172 Diamonds", c, dec!(43_000), dec!(1_500)),
        Product::new("FF100", "FF 100 Diamonds", c, dec!(15_000), dec!(750)),
        Product::new("FF310", "FF 310 Diamonds", c, dec!(46_000), dec!(1_500)),
        Product::new("PUBG60", "PUBG 60 UC", c, dec!(15_000), dec!(750)),
        Product::new("PUBG325", "PUBG 325 UC", c, dec!(75_000), dec!(2_000)),
        Product::new("GI60", "Genshin 60 Genesis", c, dec!(16_000), dec!(750)),
        Product::new("GI300", "Genshin 300 Genesis", c, dec!(79_000), dec!(2_000)),
        Product::new("VP475", "Valorant 475 VP", c, dec!(56_000), dec!(1_750)),
    ]
}

#[async_trait]
impl CatalogProvider for MockCatalog {
    fn products_by_category(&self, category: Category) -> Vec<Product> {
        match category {
            Category::Pulsa => pulsa_products(),
            Category::ElectricityToken => token_products(),
            Category::EWallet => ewallet_products(),
            Category::GameVoucher => game_products(),
            _ => Vec::new(),
        }
    }

    async fn lookup_customer(
        &self,
        category: Category,
        identifier: &str,
    ) -> Result<Option<CustomerRecord>> {
        if !identifier_known(category, identifier) {
            return Ok(None);
        }
        Ok(Some(synthesize_customer(category, identifier)))
    }

    fn detect_operator(&self, phone: &str) -> Option<&Operator> {
        let digits = phone.trim();
        if digits.len() < 4 || !all_digits(digits) {
            return None;
        }
        // Longest-prefix-match; first table entry wins a tie.
        let mut best: Option<(&Operator, usize)> = None;
        for operator in OPERATORS {
            for prefix in operator.prefixes {
                if digits.starts_with(prefix)
                    && best.map_or(true, |(_, len)| prefix.len() > len)
                {
                    best = Some((operator, prefix.len()));
                }
            }
        }
        best.map(|(operator, _)| operator)
    }

    fn regions(&self, category: Category) -> &[Region] {
        match category {
            Category::Pdam => PDAM_REGIONS,
            _ => &[],
        }
    }

    fn providers(&self, category: Category) -> Vec<&Provider> {
        PROVIDERS.iter().filter(|p| p.category == category).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lookup_is_deterministic() {
        let catalog = MockCatalog::new();
        let first = catalog
            .lookup_customer(Category::ElectricityBill, "14012345678")
            .await
            .unwrap()
            .unwrap();
        let second = catalog
            .lookup_customer(Category::ElectricityBill, "14012345678")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first, second);
        assert!(first.bill_amount > Decimal::ZERO);
        assert!(first.usage_kwh.is_some());
        assert!(first.tariff.is_some());
    }

    #[tokio::test]
    async fn test_lookup_not_found_is_none() {
        let catalog = MockCatalog::new();
        // Too short for a meter id.
        let result = catalog
            .lookup_customer(Category::ElectricityBill, "12345")
            .await
            .unwrap();
        assert!(result.is_none());
        // Non-digit identifier.
        let result = catalog
            .lookup_customer(Category::Bpjs, "00012345678AB")
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_bpjs_bill_scales_with_family() {
        let catalog = MockCatalog::new();
        let record = catalog
            .lookup_customer(Category::Bpjs, "0001234567890")
            .await
            .unwrap()
            .unwrap();
        let members = record.family_members.unwrap();
        let class = record.class.unwrap();
        let rate = match class {
            1 => dec!(150_000),
            2 => dec!(100_000),
            _ => dec!(42_000),
        };
        assert_eq!(record.bill_amount, rate * Decimal::from(members));
    }

    #[test]
    fn test_operator_detection() {
        let catalog = MockCatalog::new();
        assert_eq!(catalog.detect_operator("0812").unwrap().id, "telkomsel");
        assert_eq!(
            catalog.detect_operator("085712345678").unwrap().id,
            "indosat"
        );
        assert_eq!(catalog.detect_operator("0877123").unwrap().id, "xl");
        assert_eq!(catalog.detect_operator("0896").unwrap().id, "tri");
        // Ambiguous while too short.
        assert!(catalog.detect_operator("081").is_none());
        // Unrecognized prefix.
        assert!(catalog.detect_operator("0999123456").is_none());
        // Non-digit input.
        assert!(catalog.detect_operator("08ab123456").is_none());
    }

    #[test]
    fn test_longest_prefix_wins_over_shared_block() {
        let catalog = MockCatalog::new();
        // 085115 belongs to by.U even though 0851 is a Telkomsel block.
        assert_eq!(
            catalog.detect_operator("085115678901").unwrap().id,
            "byu"
        );
        // The rest of the 0851 block stays with Telkomsel.
        assert_eq!(
            catalog.detect_operator("085198765432").unwrap().id,
            "telkomsel"
        );
        // A number too short to reach the longer prefix matches the block.
        assert_eq!(catalog.detect_operator("08511").unwrap().id, "telkomsel");
    }

    #[test]
    fn test_products_ordered_by_price() {
        let catalog = MockCatalog::new();
        for category in [
            Category::Pulsa,
            Category::ElectricityToken,
            Category::EWallet,
        ] {
            let products = catalog.products_by_category(category);
            assert!(!products.is_empty());
            for pair in products.windows(2) {
                assert!(pair[0].price <= pair[1].price);
            }
        }
        // Bill categories sell no products.
        assert!(catalog.products_by_category(Category::Pdam).is_empty());
        assert!(catalog.products_by_category(Category::Withdrawal).is_empty());
    }

    #[test]
    fn test_provider_directory_scoped_by_category() {
        let catalog = MockCatalog::new();
        let wallets = catalog.providers(Category::EWallet);
        assert_eq!(wallets.len(), 5);
        assert!(wallets.iter().all(|p| p.category == Category::EWallet));
        assert!(!catalog.regions(Category::Pdam).is_empty());
        assert!(catalog.regions(Category::Pulsa).is_empty());
    }
}
