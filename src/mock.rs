//! Static fallback catalog.
//!
//! Served on the public surface whenever the relational store is
//! unconfigured, erroring, or empty, so the site stays navigable. Admin
//! surfaces never see this data.

use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::entities::product::ProductStatus;
use crate::services::catalog::{CategoryView, ProductFilter, ProductImageView, ProductView};

fn ts(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

fn category(id: u128, name: &str, slug: &str, description: &str, icon: &str) -> CategoryView {
    CategoryView {
        id: Uuid::from_u128(id),
        name: name.to_string(),
        slug: slug.to_string(),
        description: Some(description.to_string()),
        icon: Some(icon.to_string()),
        created_at: ts(2024, 1, 1),
    }
}

static CATEGORIES: Lazy<Vec<CategoryView>> = Lazy::new(|| {
    vec![
        category(
            0x11,
            "Bisnis",
            "business",
            "Sistem ERP dan manajemen bisnis terintegrasi",
            "Building",
        ),
        category(
            0x12,
            "Kasir (POS)",
            "pos",
            "Sistem kasir dan manajemen penjualan untuk berbagai jenis bisnis",
            "ShoppingCart",
        ),
        category(
            0x13,
            "Komunitas",
            "community",
            "Sistem manajemen untuk RT/RW dan organisasi komunitas",
            "Users",
        ),
        category(
            0x14,
            "Kustom",
            "custom",
            "Solusi software kustom sesuai kebutuhan spesifik",
            "Code",
        ),
        category(
            0x15,
            "Pendidikan",
            "education",
            "Sistem manajemen untuk lembaga pendidikan dan bimbel",
            "GraduationCap",
        ),
    ]
});

struct MockProduct {
    id: u128,
    name: &'static str,
    slug: &'static str,
    short_description: &'static str,
    description: &'static str,
    price: Option<i64>,
    category_slug: &'static str,
    image_url: &'static str,
    image_alt: &'static str,
    features: &'static [&'static str],
    tech_stack: &'static [&'static str],
    demo_url: Option<&'static str>,
    is_featured: bool,
    status: ProductStatus,
    created: (i32, u32, u32),
}

const PRODUCTS: &[MockProduct] = &[
    MockProduct {
        id: 0x21,
        name: "Sistem Manajemen Bimbel",
        slug: "sistem-manajemen-bimbel",
        short_description: "Solusi lengkap untuk mengelola bimbel dengan pendaftaran siswa, jadwal, absensi, dan pembayaran.",
        description: "Sistem manajemen komprehensif yang dirancang khusus untuk bimbel dan lembaga pendidikan di Indonesia. Fitur meliputi pendaftaran siswa, penjadwalan kelas, pencatatan absensi, manajemen pembayaran, laporan kemajuan, dan notifikasi orang tua.",
        price: Some(8_000_000),
        category_slug: "education",
        image_url: "https://placehold.co/800x600/fafafa/171717?text=Bimbel",
        image_alt: "Dashboard Bimbel",
        features: &[
            "Pendaftaran dan profil siswa",
            "Penjadwalan kelas dan alokasi ruangan",
            "Pencatatan absensi",
            "Manajemen pembayaran dengan laporan",
            "Laporan kemajuan dan penilaian",
            "Portal orang tua untuk monitoring",
        ],
        tech_stack: &["Laravel", "MySQL", "Bootstrap", "JavaScript"],
        demo_url: Some("#"),
        is_featured: true,
        status: ProductStatus::Active,
        created: (2024, 3, 5),
    },
    MockProduct {
        id: 0x22,
        name: "Sistem Manajemen RT/RW",
        slug: "sistem-manajemen-rt-rw",
        short_description: "Solusi digital untuk pengelolaan warga, iuran, dan pembuatan surat menyurat.",
        description: "Sistem manajemen RT/RW modern yang mendigitalisasi administrasi lingkungan. Kelola data warga dengan mudah, pantau iuran bulanan, buat surat-surat resmi, dan fasilitasi komunikasi antar warga.",
        price: Some(6_000_000),
        category_slug: "community",
        image_url: "https://placehold.co/800x600/f4f4f5/171717?text=RT-RW",
        image_alt: "Dashboard RT/RW",
        features: &[
            "Database warga dengan silsilah keluarga",
            "Pencatatan iuran bulanan",
            "Generate kwitansi otomatis",
            "Template surat resmi (SK, domisili, dll)",
            "Laporan keuangan transparan",
        ],
        tech_stack: &["Laravel", "MySQL", "Livewire", "Tailwind CSS"],
        demo_url: Some("#"),
        is_featured: true,
        status: ProductStatus::Active,
        created: (2024, 2, 20),
    },
    MockProduct {
        id: 0x23,
        name: "Sistem Kasir Retail",
        slug: "sistem-kasir-retail",
        short_description: "Sistem POS dengan manajemen stok, laporan penjualan, dan multi-cabang.",
        description: "Solusi POS lengkap untuk bisnis retail. Kelola penjualan, stok, supplier, dan pelanggan dari satu dashboard. Mendukung multi-cabang, manajemen karyawan, dan laporan komprehensif.",
        price: Some(7_000_000),
        category_slug: "pos",
        image_url: "https://placehold.co/800x600/e4e4e7/171717?text=POS",
        image_alt: "Dashboard POS",
        features: &[
            "Pencarian produk dan checkout cepat",
            "Manajemen stok dengan alert stok rendah",
            "Manajemen multi-cabang",
            "Role dan hak akses karyawan",
            "Laporan penjualan harian dan bulanan",
            "Cetak struk dan faktur",
        ],
        tech_stack: &["Laravel", "MySQL", "Vue.js", "Bootstrap"],
        demo_url: Some("#"),
        is_featured: true,
        status: ProductStatus::Active,
        created: (2024, 2, 1),
    },
    MockProduct {
        id: 0x24,
        name: "Sistem Manajemen Percetakan",
        slug: "sistem-manajemen-percetakan",
        short_description: "Kelola pesanan cetak, pantau status produksi, dan atur antrian dengan efisien.",
        description: "Sistem manajemen khusus untuk bisnis percetakan. Lacak pesanan dari masuk hingga selesai, kelola antrian produksi, atur variasi harga, dan simpan riwayat pelanggan.",
        price: Some(5_500_000),
        category_slug: "business",
        image_url: "https://placehold.co/800x600/d4d4d8/171717?text=Printing",
        image_alt: "Dashboard Percetakan",
        features: &[
            "Input pesanan dengan upload file",
            "Manajemen antrian produksi",
            "Kalkulator harga untuk jenis cetak berbeda",
            "Riwayat pesanan pelanggan",
            "Generate invoice",
        ],
        tech_stack: &["Laravel", "MySQL", "jQuery", "Bootstrap"],
        demo_url: Some("#"),
        is_featured: false,
        status: ProductStatus::Active,
        created: (2024, 1, 18),
    },
    MockProduct {
        id: 0x25,
        name: "Sistem Manajemen Stok",
        slug: "sistem-manajemen-stok",
        short_description: "Pantau level stok, kelola supplier, dan dapatkan notifikasi stok menipis.",
        description: "Sistem manajemen stok yang simpel tapi powerful. Pantau level stok real-time, kelola informasi supplier, terima notifikasi stok menipis, dan generate laporan inventori komprehensif.",
        price: Some(5_000_000),
        category_slug: "business",
        image_url: "https://placehold.co/800x600/a1a1aa/ffffff?text=Inventory",
        image_alt: "Dashboard Stok",
        features: &[
            "Manajemen produk dan kategori",
            "Pencatatan stok masuk/keluar",
            "Notifikasi stok menipis",
            "Manajemen supplier",
            "Laporan valuasi inventori",
        ],
        tech_stack: &["Laravel", "MySQL", "Alpine.js", "Tailwind CSS"],
        demo_url: None,
        is_featured: true,
        status: ProductStatus::ComingSoon,
        created: (2024, 1, 10),
    },
];

static PRODUCT_VIEWS: Lazy<Vec<ProductView>> = Lazy::new(|| {
    PRODUCTS
        .iter()
        .map(|p| {
            let category = CATEGORIES
                .iter()
                .find(|c| c.slug == p.category_slug)
                .cloned();
            let category_id = category
                .as_ref()
                .map(|c| c.id)
                .unwrap_or_else(|| Uuid::from_u128(0));
            let id = Uuid::from_u128(p.id);
            let created_at = ts(p.created.0, p.created.1, p.created.2);
            ProductView {
                id,
                name: p.name.to_string(),
                slug: p.slug.to_string(),
                short_description: p.short_description.to_string(),
                description: p.description.to_string(),
                price: p.price.map(Decimal::from),
                category_id,
                category,
                images: vec![ProductImageView {
                    id: Uuid::from_u128(p.id << 8),
                    product_id: id,
                    url: p.image_url.to_string(),
                    alt: Some(p.image_alt.to_string()),
                    sort_order: 0,
                }],
                features: p.features.iter().map(|s| s.to_string()).collect(),
                tech_stack: p.tech_stack.iter().map(|s| s.to_string()).collect(),
                demo_url: p.demo_url.map(str::to_string),
                is_featured: p.is_featured,
                status: p.status,
                created_at,
                updated_at: created_at,
            }
        })
        .collect()
});

/// All mock categories, ordered by name.
pub fn categories() -> Vec<CategoryView> {
    CATEGORIES.clone()
}

/// Active mock products matching the public listing filter, newest first.
pub fn products_filtered(filter: &ProductFilter) -> Vec<ProductView> {
    let mut products: Vec<ProductView> = PRODUCT_VIEWS
        .iter()
        .filter(|p| p.status == ProductStatus::Active)
        .filter(|p| match &filter.category {
            Some(slug) => p
                .category
                .as_ref()
                .map(|c| c.slug == *slug)
                .unwrap_or(false),
            None => true,
        })
        .filter(|p| filter.featured != Some(true) || p.is_featured)
        .cloned()
        .collect();
    products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    products
}

/// Mock product lookup by slug or stringified id, any status.
pub fn product_by_key(key: &str) -> Option<ProductView> {
    PRODUCT_VIEWS
        .iter()
        .find(|p| p.slug == key || p.id.to_string() == key)
        .cloned()
}
