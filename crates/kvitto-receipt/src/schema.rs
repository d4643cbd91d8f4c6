use kvitto_convert::{
    Context, ConvertError, Receiver, ScalarKind, Source, SourceKind,
};
use kvitto_document::{DocumentTree, NodeId};

/// Target positions of the check document, declared once per conversion.
#[derive(Debug, Clone)]
pub struct ReceiptNodes {
    check: NodeId,
    receipt: NodeId,
    client: NodeId,
    company: NodeId,
    item: NodeId,
    item_vat: NodeId,
    payment: NodeId,
    vat: NodeId,
}

impl ReceiptNodes {
    /// Declares the full schema shape in `tree`. Nothing is materialized
    /// until the walk writes content.
    pub fn declare(tree: &mut DocumentTree) -> Self {
        let root = tree.root();
        let check = tree.child(root, "check");
        let receipt = tree.child(check, "receipt");
        let client = tree.child(receipt, "client");
        let company = tree.child(receipt, "company");
        let items = tree.array(receipt, "items");
        let item = tree.child(items, "item");
        let item_vat = tree.child(item, "vat");
        let payments = tree.array(receipt, "payments");
        let payment = tree.child(payments, "payment");
        let vats = tree.array(receipt, "vats");
        let vat = tree.child(vats, "vat");
        ReceiptNodes {
            check,
            receipt,
            client,
            company,
            item,
            item_vat,
            payment,
            vat,
        }
    }
}

/// Schema positions; each is one link of the dispatch chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pos {
    /// Searching for an object under the anchor key `check` at any depth.
    Root,
    Check,
    Receipt,
    Client,
    Company,
    Items,
    /// Per-element dispatch when `item` arrives as an array.
    ItemSeq,
    Item,
    ItemVat,
    Payments,
    PaymentSeq,
    Payment,
    Vats,
    VatSeq,
    Vat,
}

/// Chain-of-responsibility dispatch for the check schema. A cheap copyable
/// value; build a fresh one (with fresh [`ReceiptNodes`]) per conversion.
#[derive(Debug, Clone, Copy)]
pub struct ReceiptReceiver<'n> {
    nodes: &'n ReceiptNodes,
    pos: Pos,
}

impl<'n> ReceiptReceiver<'n> {
    /// The synthetic root receiver, in the searching state.
    pub fn root(nodes: &'n ReceiptNodes) -> Self {
        ReceiptReceiver {
            nodes,
            pos: Pos::Root,
        }
    }

    fn at(&self, pos: Pos) -> Self {
        ReceiptReceiver {
            nodes: self.nodes,
            pos,
        }
    }

    /// Cardinality resolved per occurrence by the value's shape: a single
    /// object opens one fresh element and routes straight to the item
    /// receiver; anything else routes through the per-element sequence
    /// receiver (which validates that it is in fact an array).
    fn element(
        &self,
        ctx: &mut Context<'_, serde_json::Value, DocumentTree>,
        node: NodeId,
        item: Pos,
        seq: Pos,
    ) -> Result<Option<Self>, ConvertError> {
        match ctx.value().kind() {
            SourceKind::Object => {
                ctx.new_element(node)?;
                ctx.composite(self.at(item))
            }
            _ => ctx.composite(self.at(seq)),
        }
    }

    /// The shared type/sum leaf pair (payments, vats, item VAT).
    fn type_sum(
        &self,
        ctx: &mut Context<'_, serde_json::Value, DocumentTree>,
        node: NodeId,
    ) -> Result<Option<Self>, ConvertError> {
        match ctx.key() {
            "type" => {
                ctx.append(node, ScalarKind::Text)?;
            }
            "sum" => {
                ctx.append(node, ScalarKind::Number)?;
            }
            _ => ctx.unknown_attribute()?,
        }
        Ok(None)
    }
}

impl<'n> Receiver<serde_json::Value> for ReceiptReceiver<'n> {
    type Acc = DocumentTree;

    fn receive(
        &self,
        ctx: &mut Context<'_, serde_json::Value, DocumentTree>,
    ) -> Result<Option<Self>, ConvertError> {
        let nodes = self.nodes;
        match self.pos {
            Pos::Root => {
                if ctx.key() == "check" && ctx.value().kind() == SourceKind::Object {
                    Ok(Some(self.at(Pos::Check)))
                } else {
                    Ok(Some(*self))
                }
            }
            Pos::Check => match ctx.key() {
                "timestamp" | "external_id" => {
                    ctx.append(nodes.check, ScalarKind::Text)?;
                    Ok(None)
                }
                "is_bso" => {
                    ctx.append(nodes.check, ScalarKind::Flag)?;
                    Ok(None)
                }
                "receipt" => ctx.composite(self.at(Pos::Receipt)),
                _ => {
                    ctx.unknown_attribute()?;
                    Ok(None)
                }
            },
            Pos::Receipt => match ctx.key() {
                "total" => {
                    ctx.append(nodes.receipt, ScalarKind::Number)?;
                    Ok(None)
                }
                "operation" | "cashier" => {
                    ctx.append(nodes.receipt, ScalarKind::Text)?;
                    Ok(None)
                }
                "client" => ctx.composite(self.at(Pos::Client)),
                "company" => ctx.composite(self.at(Pos::Company)),
                "items" => ctx.composite(self.at(Pos::Items)),
                "payments" => ctx.composite(self.at(Pos::Payments)),
                "vats" => ctx.composite(self.at(Pos::Vats)),
                _ => {
                    ctx.unknown_attribute()?;
                    Ok(None)
                }
            },
            Pos::Client => {
                match ctx.key() {
                    "email" => {
                        ctx.append(nodes.client, ScalarKind::Text)?;
                    }
                    _ => ctx.unknown_attribute()?,
                }
                Ok(None)
            }
            Pos::Company => {
                match ctx.key() {
                    "email" | "sno" | "inn" | "payment_address" => {
                        ctx.append(nodes.company, ScalarKind::Text)?;
                    }
                    _ => ctx.unknown_attribute()?,
                }
                Ok(None)
            }
            Pos::Items => match ctx.key() {
                "item" => self.element(ctx, nodes.item, Pos::Item, Pos::ItemSeq),
                _ => {
                    ctx.unknown_attribute()?;
                    Ok(None)
                }
            },
            Pos::ItemSeq => {
                ctx.new_element(nodes.item)?;
                ctx.composite(self.at(Pos::Item))
            }
            Pos::Item => match ctx.key() {
                "price" | "quantity" | "sum" => {
                    ctx.append(nodes.item, ScalarKind::Number)?;
                    Ok(None)
                }
                "name" | "measurement_unit" | "payment_method" | "payment_object" => {
                    ctx.append(nodes.item, ScalarKind::Text)?;
                    Ok(None)
                }
                "vat" => ctx.composite(self.at(Pos::ItemVat)),
                _ => {
                    ctx.unknown_attribute()?;
                    Ok(None)
                }
            },
            Pos::ItemVat => self.type_sum(ctx, nodes.item_vat),
            Pos::Payments => match ctx.key() {
                "payment" => self.element(ctx, nodes.payment, Pos::Payment, Pos::PaymentSeq),
                _ => {
                    ctx.unknown_attribute()?;
                    Ok(None)
                }
            },
            Pos::PaymentSeq => {
                ctx.new_element(nodes.payment)?;
                ctx.composite(self.at(Pos::Payment))
            }
            Pos::Payment => self.type_sum(ctx, nodes.payment),
            Pos::Vats => match ctx.key() {
                "vat" => self.element(ctx, nodes.vat, Pos::Vat, Pos::VatSeq),
                _ => {
                    ctx.unknown_attribute()?;
                    Ok(None)
                }
            },
            Pos::VatSeq => {
                ctx.new_element(nodes.vat)?;
                ctx.composite(self.at(Pos::Vat))
            }
            Pos::Vat => self.type_sum(ctx, nodes.vat),
        }
    }
}
