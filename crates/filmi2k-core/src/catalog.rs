//! Category table of filmi2k.com
//!
//! Static for the life of the process. Each category knows its rendered
//! page path and the taxonomy term the structured API filters on.

use serde::Serialize;

use self::ListingFilter::{Category as Cat, Newest, Tag};

/// How a category filters the site's posts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ListingFilter {
    /// Site root: newest releases, unfiltered
    Newest,
    /// WordPress category slug
    Category(&'static str),
    /// WordPress tag slug
    Tag(&'static str),
}

impl ListingFilter {
    /// REST collection the term lives in, if any
    pub fn taxonomy(&self) -> Option<(&'static str, &'static str)> {
        match self {
            ListingFilter::Newest => None,
            ListingFilter::Category(slug) => Some(("categories", slug)),
            ListingFilter::Tag(slug) => Some(("tags", slug)),
        }
    }
}

/// A browsable catalog of the site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: &'static str,
    pub name: &'static str,
    /// Rendered page path, always with leading and trailing slash
    pub path: &'static str,
    pub filter: ListingFilter,
}

const fn category(
    id: &'static str,
    name: &'static str,
    path: &'static str,
    filter: ListingFilter,
) -> Category {
    Category {
        id,
        name,
        path,
        filter,
    }
}

static CATEGORIES: &[Category] = &[
    category("filmi2k-ekshan", "Екшън", "/category/filmi-ekshan/", Cat("filmi-ekshan")),
    category("filmi2k-komediya", "Комедия", "/category/komediya-filmi/", Cat("komediya-filmi")),
    category("filmi2k-fantastika", "Фантастика", "/category/filmi-fantastika/", Cat("filmi-fantastika")),
    category("filmi2k-ujasi", "Ужаси", "/category/filmi-ujasi/", Cat("filmi-ujasi")),
    category(
        "filmi2k-priklyuchenski",
        "Приключенски",
        "/category/filmi-priklyuchenski1/",
        Cat("filmi-priklyuchenski1"),
    ),
    category("filmi2k-drama", "Драма", "/category/filmi-drama/", Cat("filmi-drama")),
    category("filmi2k-trilar", "Трилър", "/category/filmi-trilar/", Cat("filmi-trilar")),
    category("filmi2k-animatsiya", "Анимация", "/category/filmi-animatsiya/", Cat("filmi-animatsiya")),
    category("filmi2k-western", "Уестърн", "/category/filmi-western/", Cat("filmi-western")),
    category("filmi2k-voenni", "Военни", "/category/filmi-voenni/", Cat("filmi-voenni")),
    category("filmi2k-indiiski", "Индийски", "/category/indiiski-filmi/", Cat("indiiski-filmi")),
    category("filmi2k-top-imdb", "Топ IMDb", "/tag/top-250-imdb-filmi/", Tag("top-250-imdb-filmi")),
    category(
        "filmi2k-dokumentalni",
        "Документални",
        "/category/nauchno-populyarni-filmi/",
        Cat("nauchno-populyarni-filmi"),
    ),
    // Series live on a plain page; the term lookup misses and markup takes over.
    category("filmi2k-seriali", "Сериали", "/onlayn-seriali/", Cat("onlayn-seriali")),
    category("filmi2k-newest", "Най-нови", "/", Newest),
];

/// Looks up a category by its catalog identifier
pub fn category_by_id(id: &str) -> Option<&'static Category> {
    CATEGORIES.iter().find(|c| c.id == id)
}

/// All categories in display order
pub fn categories() -> &'static [Category] {
    CATEGORIES
}
