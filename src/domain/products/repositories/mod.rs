//! Product Repositories

mod categories;
mod products;

pub(crate) use categories::FileCategoriesRepository;
pub(crate) use products::FileProductsRepository;
