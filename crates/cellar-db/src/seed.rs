//! # Seed Data
//!
//! Reference content inserted by the schema manager the first time it finds
//! an empty product table.
//!
//! Swapping the starter catalogue or the default admin credential is a
//! configuration concern: build a different [`SeedData`] and hand it to
//! [`DbConfig::seed_data`](crate::DbConfig::seed_data).

use cellar_core::{Category, NewUser, Product};

/// Username of the administrator created on first start.
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";

/// Initial password of that administrator. Change it after first login.
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

const DEFAULT_ADMIN_PHONE: &str = "0901234567";

/// Content written by the one-time seed.
///
/// Categories and products carry fixed ids so that seed products can point
/// at seed categories.
#[derive(Debug, Clone)]
pub struct SeedData {
    pub categories: Vec<Category>,
    pub products: Vec<Product>,
    /// Always stored with the admin flag set.
    pub admin: NewUser,
}

impl Default for SeedData {
    fn default() -> Self {
        SeedData {
            categories: default_categories(),
            products: vec![Product {
                id: 1,
                name: "Château Margaux 2018".to_string(),
                price: 15_000_000.0,
                img: Some(
                    "https://royalwine.com.vn/wp-content/uploads/2021/06/Chateau-Margaux-1er-Cru-Classe.jpg"
                        .to_string(),
                ),
                category_id: 1,
            }],
            admin: NewUser::new(DEFAULT_ADMIN_USERNAME, DEFAULT_ADMIN_PASSWORD)
                .admin()
                .with_phone(DEFAULT_ADMIN_PHONE),
        }
    }
}

impl SeedData {
    /// Seed with no catalogue, only the administrator.
    pub fn admin_only() -> Self {
        SeedData {
            categories: Vec::new(),
            products: Vec::new(),
            ..SeedData::default()
        }
    }
}

fn default_categories() -> Vec<Category> {
    [
        (
            1,
            "Château Margaux",
            "https://royalwine.com.vn/wp-content/uploads/2021/06/Chateau-Margaux-1er-Cru-Classe.jpg",
        ),
        (
            2,
            "DRC (Romanée-Conti)",
            "https://sanhruou.com/media/18238/content/chai-domaine-de-la-romanee-conti-la-tache-1972-duoc-ban-voi-gia-150-000-usd.jpg",
        ),
        (
            3,
            "Penfolds Grange",
            "https://thekeywine.vn/wp-content/uploads/2023/06/Penfolds-Grange-Bin-95-1.jpg",
        ),
        (
            4,
            "Antinori Tignanello",
            "https://winecellar.vn/wp-content/uploads/2022/10/ruou-vang-my-treana-red-1067x800.jpg",
        ),
        (
            5,
            "Moët & Chandon",
            "https://bizweb.dktcdn.net/100/132/269/products/ruou-mo-vay-vang-500ml.jpg?v=1566963485860",
        ),
        (
            6,
            "Cloudy Bay",
            "https://thanhnien.mediacdn.vn/Uploaded/minhnguyet/2016_03_03/ruounho_FLKG.jpg",
        ),
    ]
    .into_iter()
    .map(|(id, name, icon)| Category {
        id,
        name: name.to_string(),
        icon_uri: Some(icon.to_string()),
    })
    .collect()
}
