//! Shopping list and per-product reactions, kept for the client session.

use uuid::Uuid;

use joyeria_shared::Product;

use crate::error::CartError;

/// What the cart remembers about a product.
#[derive(Debug, Clone, PartialEq)]
pub struct CartItem {
    pub id: Uuid,
    pub name: String,
    pub meta: String,
    pub price: f64,
}

impl From<&Product> for CartItem {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            meta: product.meta.clone(),
            price: product.price,
        }
    }
}

/// Cart presence plus reaction flags for one product id. The flags are
/// independent of each other and of the item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartEntry {
    pub item: Option<CartItem>,
    pub liked: bool,
    pub disliked: bool,
    pub favorited: bool,
}

impl CartEntry {
    fn is_empty(&self) -> bool {
        self.item.is_none() && !self.liked && !self.disliked && !self.favorited
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    entries: Vec<(Uuid, CartEntry)>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, id: Uuid) -> &mut CartEntry {
        let idx = match self.entries.iter().position(|(k, _)| *k == id) {
            Some(idx) => idx,
            None => {
                self.entries.push((id, CartEntry::default()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[idx].1
    }

    fn prune(&mut self) {
        self.entries.retain(|(_, e)| !e.is_empty());
    }

    /// Insert or replace the item for its product id. Adding twice keeps one
    /// entry holding the latest data.
    pub fn add_item(&mut self, item: CartItem) {
        let id = item.id;
        self.slot(id).item = Some(item);
    }

    /// Add a catalog product, refusing products without stock.
    pub fn add_product(&mut self, product: &Product) -> Result<(), CartError> {
        if !product.in_stock() {
            return Err(CartError::OutOfStock { id: product.id });
        }
        self.add_item(CartItem::from(product));
        Ok(())
    }

    /// Remove the item; reactions survive. Returns whether an item was held.
    pub fn remove_item(&mut self, id: Uuid) -> bool {
        let removed = self
            .entries
            .iter_mut()
            .find(|(k, _)| *k == id)
            .and_then(|(_, e)| e.item.take())
            .is_some();
        self.prune();
        removed
    }

    /// Drop every item and reaction.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn toggle_like(&mut self, id: Uuid) -> bool {
        let entry = self.slot(id);
        entry.liked = !entry.liked;
        let now = entry.liked;
        self.prune();
        now
    }

    pub fn toggle_dislike(&mut self, id: Uuid) -> bool {
        let entry = self.slot(id);
        entry.disliked = !entry.disliked;
        let now = entry.disliked;
        self.prune();
        now
    }

    pub fn toggle_favorite(&mut self, id: Uuid) -> bool {
        let entry = self.slot(id);
        entry.favorited = !entry.favorited;
        let now = entry.favorited;
        self.prune();
        now
    }

    pub fn entry(&self, id: Uuid) -> Option<&CartEntry> {
        self.entries.iter().find(|(k, _)| *k == id).map(|(_, e)| e)
    }

    /// Items in the order they were first added.
    pub fn items(&self) -> impl Iterator<Item = &CartItem> {
        self.entries.iter().filter_map(|(_, e)| e.item.as_ref())
    }

    pub fn len(&self) -> usize {
        self.items().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn total(&self) -> f64 {
        self.items().map(|i| i.price).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::sample_product;

    #[test]
    fn test_adding_twice_replaces_the_entry() {
        let mut cart = Cart::new();
        let mut product = sample_product("Anillo", 3);
        cart.add_product(&product).unwrap();

        product.price = 75_000.0;
        cart.add_product(&product).unwrap();

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.total(), 75_000.0);
    }

    #[test]
    fn test_adding_an_item_keeps_existing_reactions() {
        let mut cart = Cart::new();
        let product = sample_product("Aretes", 2);
        assert!(cart.toggle_like(product.id));

        cart.add_item(CartItem::from(&product));

        let entry = cart.entry(product.id).unwrap();
        assert!(entry.liked);
        assert_eq!(entry.item.as_ref().map(|i| i.id), Some(product.id));
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn test_out_of_stock_is_rejected() {
        let mut cart = Cart::new();
        let product = sample_product("Collar", 0);
        assert_eq!(
            cart.add_product(&product),
            Err(CartError::OutOfStock { id: product.id })
        );
        assert!(cart.is_empty());
        assert!(cart.entry(product.id).is_none());
    }

    #[test]
    fn test_reactions_are_independent() {
        let mut cart = Cart::new();
        let id = Uuid::new_v4();

        assert!(cart.toggle_like(id));
        assert!(cart.toggle_dislike(id));
        assert!(cart.toggle_favorite(id));
        let entry = cart.entry(id).unwrap();
        assert!(entry.liked && entry.disliked && entry.favorited);
        assert!(entry.item.is_none());

        assert!(!cart.toggle_like(id));
        assert!(cart.entry(id).unwrap().disliked);
    }

    #[test]
    fn test_removing_item_keeps_reactions() {
        let mut cart = Cart::new();
        let product = sample_product("Pendientes", 1);
        cart.add_product(&product).unwrap();
        cart.toggle_favorite(product.id);

        assert!(cart.remove_item(product.id));
        assert!(!cart.remove_item(product.id));
        assert!(cart.entry(product.id).unwrap().favorited);
        assert!(cart.is_empty());

        cart.toggle_favorite(product.id);
        assert!(cart.entry(product.id).is_none());
    }

    #[test]
    fn test_items_keep_insertion_order() {
        let mut cart = Cart::new();
        let a = sample_product("A", 1);
        let b = sample_product("B", 1);
        cart.add_product(&a).unwrap();
        cart.add_product(&b).unwrap();
        cart.add_product(&a).unwrap();

        let names: Vec<_> = cart.items().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);

        cart.clear();
        assert!(cart.is_empty());
    }
}
