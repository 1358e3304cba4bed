mod properties;
mod transactions;
