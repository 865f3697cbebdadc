use async_trait::async_trait;
use stream_out_types::formatting::{format_coins, format_thousands};

use super::{SourceContext, StatSource, log_skipped};
use crate::api::Permission;
use crate::api::models::{CURRENCY_COINS, CURRENCY_KARMA, WalletEntry};

const NAME: &str = "wallet";
const SCOPES: &[Permission] = &[Permission::Account, Permission::Wallet];

const OUT_COINS: &str = "wallet_coins.txt";
const OUT_KARMA: &str = "wallet_karma.txt";

/// Shown until the first successful fetch, sized like a typical balance.
const PLACEHOLDER_AMOUNT: i64 = 10_000_000;

/// Gold and karma balances. No resets; every tick republishes.
pub struct WalletSource {
    ctx: SourceContext,
}

impl WalletSource {
    pub fn new(ctx: SourceContext) -> Self {
        Self { ctx }
    }
}

fn balance(wallet: &[WalletEntry], currency: u32) -> i64 {
    wallet
        .iter()
        .find(|e| e.id == currency)
        .map(|e| e.value)
        .unwrap_or(0)
}

#[async_trait]
impl StatSource for WalletSource {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn initialize(&mut self) {
        let sink = &self.ctx.sink;
        sink.write_placeholder(OUT_COINS, format_coins(PLACEHOLDER_AMOUNT)).await;
        sink.write_placeholder(OUT_KARMA, format_thousands(PLACEHOLDER_AMOUNT)).await;
    }

    async fn update(&mut self) {
        let wallet = match self
            .ctx
            .fetcher
            .fetch("wallet", SCOPES, || self.ctx.api.wallet())
            .await
        {
            Ok(wallet) => wallet,
            Err(e) => return log_skipped(NAME, OUT_COINS, &e),
        };

        let sink = &self.ctx.sink;
        sink.write_text(OUT_COINS, format_coins(balance(&wallet, CURRENCY_COINS))).await;
        sink.write_text(OUT_KARMA, format_thousands(balance(&wallet, CURRENCY_KARMA))).await;
    }

    async fn clear(&mut self) {
        self.ctx.delete_all(&[OUT_COINS, OUT_KARMA]).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Harness;

    #[tokio::test]
    async fn test_publishes_formatted_balances() {
        let h = Harness::new();
        h.api.wallet.set(vec![
            WalletEntry { id: CURRENCY_COINS, value: 1_234_567 },
            WalletEntry { id: CURRENCY_KARMA, value: 98_765 },
            WalletEntry { id: 4, value: 300 },
        ]);
        let mut source = WalletSource::new(h.ctx.clone());
        source.update().await;

        assert_eq!(h.sink.text(OUT_COINS).as_deref(), Some("123g 45s 67c"));
        assert_eq!(h.sink.text(OUT_KARMA).as_deref(), Some("98,765"));
    }

    #[tokio::test]
    async fn test_missing_currency_is_zero() {
        let h = Harness::new();
        h.api.wallet.set(vec![]);
        let mut source = WalletSource::new(h.ctx.clone());
        source.update().await;

        assert_eq!(h.sink.text(OUT_COINS).as_deref(), Some("0g 0s 0c"));
        assert_eq!(h.sink.text(OUT_KARMA).as_deref(), Some("0"));
    }

    #[tokio::test]
    async fn test_without_wallet_permission_keeps_placeholders() {
        let h = Harness::without(Permission::Wallet);
        let mut source = WalletSource::new(h.ctx.clone());
        source.initialize().await;
        source.update().await;

        assert_eq!(h.sink.text(OUT_COINS).as_deref(), Some("1,000g 0s 0c"));
        assert_eq!(h.api.calls("wallet"), 0);
    }
}
