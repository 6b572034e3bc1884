//! In-memory paper portfolio: the simulated collaborator the CLI wires in.
//! Holds cash and positions with average-cost basis; durable persistence
//! stays outside the core.

use crate::domain::error::DomainError;
use crate::domain::ports::portfolio::{Holding, PortfolioPort, TradeFill};
use crate::domain::values::action::OrderSide;
use std::collections::HashMap;
use std::sync::Mutex;

struct Book {
    cash: f64,
    holdings: HashMap<String, Holding>,
}

pub struct PaperPortfolio {
    book: Mutex<Book>,
}

impl PaperPortfolio {
    pub fn new(starting_cash: f64) -> Self {
        Self {
            book: Mutex::new(Book {
                cash: starting_cash,
                holdings: HashMap::new(),
            }),
        }
    }

    /// Mark a held position to a new market price.
    pub fn mark_price(&self, symbol: &str, price: f64) {
        let mut book = self.book.lock().unwrap();
        if let Some(holding) = book.holdings.get_mut(&symbol.to_uppercase()) {
            holding.current_price = price;
        }
    }

    /// Seed a position directly, for tests and demos.
    pub fn with_holding(self, symbol: &str, quantity: u64, avg_price: f64) -> Self {
        {
            let mut book = self.book.lock().unwrap();
            book.holdings.insert(
                symbol.to_uppercase(),
                Holding {
                    symbol: symbol.to_uppercase(),
                    quantity,
                    avg_price,
                    current_price: avg_price,
                },
            );
        }
        self
    }
}

#[async_trait::async_trait]
impl PortfolioPort for PaperPortfolio {
    async fn get_holdings(&self) -> Result<HashMap<String, Holding>, DomainError> {
        Ok(self.book.lock().unwrap().holdings.clone())
    }

    async fn get_cash_balance(&self) -> Result<f64, DomainError> {
        Ok(self.book.lock().unwrap().cash)
    }

    async fn execute_trade(
        &self,
        symbol: &str,
        side: OrderSide,
        quantity: u64,
        price: f64,
    ) -> Result<TradeFill, DomainError> {
        if quantity == 0 || price <= 0.0 {
            return Err(DomainError::InvalidInput(format!(
                "cannot fill {quantity} shares of {symbol} at {price}"
            )));
        }
        let symbol = symbol.to_uppercase();
        let total = quantity as f64 * price;
        let mut book = self.book.lock().unwrap();

        match side {
            OrderSide::Buy => {
                if book.cash < total {
                    return Err(DomainError::InsufficientFunds {
                        needed: total,
                        available: book.cash,
                    });
                }
                book.cash -= total;
                let holding = book.holdings.entry(symbol.clone()).or_insert(Holding {
                    symbol: symbol.clone(),
                    quantity: 0,
                    avg_price: 0.0,
                    current_price: price,
                });
                let old_cost = holding.cost_basis();
                holding.quantity += quantity;
                holding.avg_price = (old_cost + total) / holding.quantity as f64;
                holding.current_price = price;
            }
            OrderSide::Sell => {
                let holding = book.holdings.get_mut(&symbol).ok_or_else(|| {
                    DomainError::InsufficientShares {
                        symbol: symbol.clone(),
                        needed: quantity,
                        available: 0,
                    }
                })?;
                if holding.quantity < quantity {
                    return Err(DomainError::InsufficientShares {
                        symbol: symbol.clone(),
                        needed: quantity,
                        available: holding.quantity,
                    });
                }
                holding.quantity -= quantity;
                holding.current_price = price;
                let emptied = holding.quantity == 0;
                book.cash += total;
                if emptied {
                    book.holdings.remove(&symbol);
                }
            }
        }

        Ok(TradeFill {
            symbol,
            side,
            quantity,
            price,
            total,
        })
    }
}
