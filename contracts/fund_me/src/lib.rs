#![cfg_attr(not(feature = "std"), no_std, no_main)]

pub mod price_converter;

pub mod constants {
    /// Decimals carried by native amounts and by reference-currency values.
    pub const NATIVE_DECIMALS: u8 = 18;

    /// One whole unit at [`NATIVE_DECIMALS`].
    pub const PRECISION: u128 = 1_000_000_000_000_000_000;

    /// Smallest accepted contribution: 50 reference-currency units.
    pub const MINIMUM_USD: u128 = 50 * PRECISION;
}

/// # FundMe: oracle-gated contribution ledger
///
/// Accepts native-value contributions worth at least [`constants::MINIMUM_USD`]
/// at the bound price feed's current rate, records them per funder, and lets
/// the deploying account sweep everything out in one go.
///
/// Two sweep paths exist. `withdraw` walks the stored funder list entry by
/// entry; `cheaper_withdraw` loads the list into memory once and works from
/// that copy. Both end in the same state.
#[ink::contract]
mod fund_me {
    use crate::constants::*;
    use crate::price_converter;
    use ink::env::call::{build_call, ExecutionInput, Selector};
    use ink::env::DefaultEnvironment;
    use ink::prelude::vec::Vec;
    use ink::storage::{Mapping, StorageVec};

    // =========================================================================
    // STORAGE
    // =========================================================================

    #[ink(storage)]
    pub struct FundMe {
        owner: AccountId,
        price_feed: AccountId,
        address_to_amount_funded: Mapping<AccountId, Balance>,
        /// One entry per accepted contribution, repeats included.
        funders: StorageVec<AccountId>,
    }

    // =========================================================================
    // EVENTS
    // =========================================================================

    #[ink(event)]
    pub struct Funded {
        #[ink(topic)]
        funder: AccountId,
        amount: Balance,
        total_funded: Balance,
    }

    #[ink(event)]
    pub struct Withdrawn {
        #[ink(topic)]
        owner: AccountId,
        amount: Balance,
        funders_cleared: u32,
        optimized: bool,
    }

    // =========================================================================
    // ERRORS
    // =========================================================================

    #[derive(Debug, PartialEq, Eq, scale::Encode, scale::Decode)]
    #[cfg_attr(feature = "std", derive(scale_info::TypeInfo))]
    pub enum Error {
        /// Contribution converts to less than `MINIMUM_USD`.
        InsufficientContribution,
        NotOwner,
        IndexOutOfRange,
        TransferFailed,
        /// Feed call failed or reported a non-positive answer.
        PriceUnavailable,
        Overflow,
    }

    pub type Result<T> = core::result::Result<T, Error>;

    // =========================================================================
    // PRICE FEED
    // =========================================================================

    /// Source of the native-to-reference conversion rate.
    pub trait PriceFeed {
        /// Value of one native unit, and the number of decimals it carries.
        fn latest_rate(&self) -> Result<(u128, u8)>;
    }

    /// `(round_id, answer, started_at, updated_at, answered_in_round)`
    pub type RoundData = (u128, i128, u64, u64, u128);

    /// Feed contract reached through cross-contract calls.
    pub struct OnChainPriceFeed {
        address: AccountId,
    }

    impl OnChainPriceFeed {
        pub fn new(address: AccountId) -> Self {
            Self { address }
        }

        pub fn version(&self) -> Result<u32> {
            build_call::<DefaultEnvironment>()
                .call(self.address)
                .exec_input(ExecutionInput::new(Selector::new(ink::selector_bytes!(
                    "version"
                ))))
                .returns::<u32>()
                .try_invoke()
                .map_err(|_| Error::PriceUnavailable)?
                .map_err(|_| Error::PriceUnavailable)
        }

        fn decimals(&self) -> Result<u8> {
            build_call::<DefaultEnvironment>()
                .call(self.address)
                .exec_input(ExecutionInput::new(Selector::new(ink::selector_bytes!(
                    "decimals"
                ))))
                .returns::<u8>()
                .try_invoke()
                .map_err(|_| Error::PriceUnavailable)?
                .map_err(|_| Error::PriceUnavailable)
        }
    }

    impl PriceFeed for OnChainPriceFeed {
        fn latest_rate(&self) -> Result<(u128, u8)> {
            let (_, answer, _, _, _) = build_call::<DefaultEnvironment>()
                .call(self.address)
                .exec_input(ExecutionInput::new(Selector::new(ink::selector_bytes!(
                    "latest_round_data"
                ))))
                .returns::<RoundData>()
                .try_invoke()
                .map_err(|_| Error::PriceUnavailable)?
                .map_err(|_| Error::PriceUnavailable)?;

            let rate = u128::try_from(answer).map_err(|_| Error::PriceUnavailable)?;
            if rate == 0 {
                return Err(Error::PriceUnavailable);
            }
            Ok((rate, self.decimals()?))
        }
    }

    // =========================================================================
    // PAYOUT
    // =========================================================================

    /// Moves native value out of the contract account.
    pub trait Payout {
        fn pay(&self, to: AccountId, amount: Balance) -> Result<()>;
    }

    /// Plain balance transfer from the executing contract.
    pub struct NativePayout;

    impl Payout for NativePayout {
        fn pay(&self, to: AccountId, amount: Balance) -> Result<()> {
            ink::env::transfer::<DefaultEnvironment>(to, amount).map_err(|_| Error::TransferFailed)
        }
    }

    // =========================================================================
    // WITHDRAWAL JOURNAL
    // =========================================================================

    /// Bookkeeping cleared by a withdrawal, replayed if the sweep fails.
    #[derive(Default)]
    struct Journal {
        funders: Vec<AccountId>,
        cleared: Vec<(AccountId, Balance)>,
    }

    impl Journal {
        fn with_capacity(len: usize) -> Self {
            Self {
                funders: Vec::new(),
                cleared: Vec::with_capacity(len),
            }
        }

        fn record(&mut self, funder: AccountId, amount: Balance) {
            if amount > 0 {
                self.cleared.push((funder, amount));
            }
        }
    }

    // =========================================================================
    // IMPLEMENTATION
    // =========================================================================

    impl FundMe {
        #[ink(constructor)]
        pub fn new(price_feed: AccountId) -> Self {
            Self {
                owner: Self::env().caller(),
                price_feed,
                address_to_amount_funded: Mapping::default(),
                funders: StorageVec::new(),
            }
        }

        // =================================================================
        // CONTRIBUTIONS
        // =================================================================

        #[ink(message, payable)]
        pub fn fund(&mut self) -> Result<()> {
            let feed = OnChainPriceFeed::new(self.price_feed);
            self.fund_with(&feed)
        }

        /// Checks the attached value against the minimum before anything is
        /// written, so a rejected contribution leaves storage untouched.
        fn fund_with<F: PriceFeed>(&mut self, feed: &F) -> Result<()> {
            let funder = self.env().caller();
            let amount = self.env().transferred_value();

            if self.conversion_with(feed, amount)? < MINIMUM_USD {
                return Err(Error::InsufficientContribution);
            }

            let total_funded = self
                .address_to_amount_funded
                .get(funder)
                .unwrap_or_default()
                .checked_add(amount)
                .ok_or(Error::Overflow)?;

            self.address_to_amount_funded.insert(funder, &total_funded);
            self.funders.push(&funder);

            self.env().emit_event(Funded {
                funder,
                amount,
                total_funded,
            });
            Ok(())
        }

        fn conversion_with<F: PriceFeed>(&self, feed: &F, amount: Balance) -> Result<Balance> {
            let (rate, scale) = feed.latest_rate()?;
            price_converter::conversion_rate(amount, rate, scale).ok_or(Error::Overflow)
        }

        // =================================================================
        // WITHDRAWALS
        // =================================================================

        #[ink(message)]
        pub fn withdraw(&mut self) -> Result<()> {
            self.withdraw_with(&NativePayout)
        }

        fn withdraw_with<P: Payout>(&mut self, payout: &P) -> Result<()> {
            self.only_owner()?;

            let mut journal = Journal::default();
            // Length and entries come from storage on every pass.
            let mut funder_index = 0;
            while funder_index < self.funders.len() {
                if let Some(funder) = self.funders.get(funder_index) {
                    let amount = self
                        .address_to_amount_funded
                        .take(funder)
                        .unwrap_or_default();
                    journal.record(funder, amount);
                    journal.funders.push(funder);
                }
                funder_index += 1;
            }
            self.funders.clear();

            self.sweep_to_owner(payout, journal, false)
        }

        #[ink(message)]
        pub fn cheaper_withdraw(&mut self) -> Result<()> {
            self.cheaper_withdraw_with(&NativePayout)
        }

        fn cheaper_withdraw_with<P: Payout>(&mut self, payout: &P) -> Result<()> {
            self.only_owner()?;

            let funders = self.load_funders();
            let mut journal = Journal::with_capacity(funders.len());
            for funder in funders.iter() {
                let amount = self
                    .address_to_amount_funded
                    .take(funder)
                    .unwrap_or_default();
                journal.record(*funder, amount);
            }
            journal.funders = funders;
            self.funders.clear();

            self.sweep_to_owner(payout, journal, true)
        }

        fn load_funders(&self) -> Vec<AccountId> {
            let length = self.funders.len();
            let mut funders = Vec::with_capacity(length as usize);
            for funder_index in 0..length {
                if let Some(funder) = self.funders.get(funder_index) {
                    funders.push(funder);
                }
            }
            funders
        }

        /// Pays the contract's whole spendable balance to the owner, value that
        /// arrived outside `fund` included. A failed payout replays the journal
        /// before the error is returned.
        fn sweep_to_owner<P: Payout>(
            &mut self,
            payout: &P,
            journal: Journal,
            optimized: bool,
        ) -> Result<()> {
            let amount = self.env().balance();

            match payout.pay(self.owner, amount) {
                Ok(()) => {
                    self.env().emit_event(Withdrawn {
                        owner: self.owner,
                        amount,
                        funders_cleared: journal.funders.len() as u32,
                        optimized,
                    });
                    Ok(())
                }
                Err(error) => {
                    self.restore(journal);
                    Err(error)
                }
            }
        }

        fn restore(&mut self, journal: Journal) {
            for (funder, amount) in journal.cleared {
                self.address_to_amount_funded.insert(funder, &amount);
            }
            for funder in journal.funders.iter() {
                self.funders.push(funder);
            }
        }

        // =================================================================
        // VIEW FUNCTIONS
        // =================================================================

        #[ink(message)]
        pub fn get_price_feed(&self) -> AccountId {
            self.price_feed
        }

        #[ink(message)]
        pub fn get_address_to_amount_funded(&self, funder: AccountId) -> Balance {
            self.address_to_amount_funded.get(funder).unwrap_or_default()
        }

        #[ink(message)]
        pub fn get_funder(&self, index: u32) -> Result<AccountId> {
            self.funders.get(index).ok_or(Error::IndexOutOfRange)
        }

        #[ink(message)]
        pub fn get_owner(&self) -> AccountId {
            self.owner
        }

        #[ink(message)]
        pub fn get_minimum_usd(&self) -> Balance {
            MINIMUM_USD
        }

        /// Reference-currency value of `amount` at the feed's current rate.
        #[ink(message)]
        pub fn get_conversion_rate(&self, amount: Balance) -> Result<Balance> {
            let feed = OnChainPriceFeed::new(self.price_feed);
            self.conversion_with(&feed, amount)
        }

        #[ink(message)]
        pub fn get_version(&self) -> Result<u32> {
            OnChainPriceFeed::new(self.price_feed).version()
        }

        fn only_owner(&self) -> Result<()> {
            if self.env().caller() != self.owner {
                return Err(Error::NotOwner);
            }
            Ok(())
        }
    }

    // =========================================================================
    // UNIT TESTS
    // =========================================================================


    // =========================================================================
    // END-TO-END TESTS
    // =========================================================================

}
