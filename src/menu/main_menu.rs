use super::submenus::{
    BalanceMenu, BuyCreditMenu, HistoryMenu, MvolaCreditMenu, TransferMenu, WithdrawMenu,
};
use super::{parse_choice, Menu, Notice, Outcome};
use crate::account::SharedLedger;
use crate::error::Result;

/// Root of the USSD tree
pub struct MainMenu {
    ledger: SharedLedger,
}

impl MainMenu {
    pub fn new(ledger: SharedLedger) -> Self {
        Self { ledger }
    }
}

impl Menu for MainMenu {
    fn key(&self) -> &str {
        ""
    }

    fn title(&self) -> String {
        "MVola - Menu Principal".to_string()
    }

    fn options(&self) -> Vec<String> {
        [
            "Acheter crédit ou Offre Yas",
            "Transférer argent",
            "Mvola Credit ou Epargne",
            "Retrait argent",
            "Voir solde",
            "Historique des transactions",
            "Quitter",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    fn handle_input(&mut self, input: &str) -> Result<Outcome> {
        let ledger = self.ledger.clone();
        let outcome = match parse_choice(input, self.options().len())? {
            1 => Outcome::push(BuyCreditMenu::new(ledger)),
            2 => Outcome::push(TransferMenu::new(ledger)),
            3 => Outcome::push(MvolaCreditMenu::new(ledger)),
            4 => Outcome::push(WithdrawMenu::new(ledger)),
            5 => Outcome::push(BalanceMenu::new(ledger)),
            6 => Outcome::push(HistoryMenu::new(ledger)),
            _ => Outcome::quit()
                .with_notice(Notice::Info("Merci d'avoir utilisé MVola. Au revoir!".to_string())),
        };
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{lock, Ledger};
    use crate::error::UssdError;
    use crate::menu::Navigator;
    use rust_decimal::Decimal;

    fn navigator(balance: i64) -> (Navigator, SharedLedger) {
        let ledger = Ledger::new("130103", "1234", Decimal::from(balance)).unwrap().into_shared();
        (Navigator::new(Box::new(MainMenu::new(ledger.clone()))), ledger)
    }

    #[test]
    fn test_buy_credit_round_trip() {
        let (mut nav, _) = navigator(1000);
        nav.handle_input("1").unwrap();
        assert_eq!(nav.current().title(), "Acheter crédit ou Offre Yas");
        assert_eq!(nav.depth(), 2);
        nav.handle_input("3").unwrap();
        assert!(nav.is_at_root());
        assert_eq!(nav.current().title(), "MVola - Menu Principal");
    }

    #[test]
    fn test_invalid_root_input_keeps_root() {
        let (mut nav, _) = navigator(1000);
        for bad in ["0", "8", "99", "abc", "", "1.5"] {
            assert_eq!(nav.handle_input(bad), Err(UssdError::InvalidSelection));
            assert!(nav.is_at_root());
        }
    }

    #[test]
    fn test_quit() {
        let (mut nav, _) = navigator(1000);
        let dispatch = nav.handle_input("7").unwrap();
        assert!(dispatch.quit);
        assert!(matches!(dispatch.notice, Some(Notice::Info(_))));
    }

    #[test]
    fn test_withdraw_flow_returns_home() {
        let (mut nav, ledger) = navigator(10_000);
        nav.handle_input("4").unwrap();
        nav.handle_input("1").unwrap();
        assert_eq!(nav.path(), "4-montant");

        assert_eq!(nav.handle_input("20000"), Err(UssdError::InsufficientFunds));
        assert_eq!(nav.path(), "4-montant");

        let dispatch = nav.handle_input("4000").unwrap();
        assert!(matches!(dispatch.notice, Some(Notice::Success(_))));
        assert!(nav.is_at_root());
        assert_eq!(lock(&ledger).balance(), Decimal::from(6_000));
    }

    #[test]
    fn test_transfer_flow_end_to_end() {
        let (mut nav, ledger) = navigator(10_000);
        for input in ["2", "1", "0341234567", "2500", "1"] {
            nav.handle_input(input).unwrap();
        }
        assert_eq!(nav.path(), "2-destinataire-montant-confirmation-pin");
        nav.handle_input("1234").unwrap();
        assert!(nav.is_at_root());
        assert_eq!(lock(&ledger).balance(), Decimal::from(7_500));
    }

    #[test]
    fn test_amount_prompt_back_pops_one_level() {
        let (mut nav, _) = navigator(10_000);
        nav.handle_input("3").unwrap();
        nav.handle_input("1").unwrap();
        nav.handle_input("0").unwrap();
        assert_eq!(nav.path(), "3");
    }
}
